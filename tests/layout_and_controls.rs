// 控件更新与布局保存恢复
mod common;

use panel_relay::gesture::UnavailableRuntime;
use panel_relay::widgets::{Content, PidGains};
use panel_relay::{PanelError, WidgetKind};
use serde_json::json;

use common::{client_with, connected_client};

#[test]
fn control_changes_are_sent_when_connected() {
    let (mut client, server, _) = connected_client();
    client.create_widget(WidgetKind::Slider, None).unwrap();
    client.create_widget(WidgetKind::Pid, Some("arm")).unwrap();

    assert!(client.set_slider_values("Slider_0", vec![0.25, 0.75]).unwrap());
    assert!(client.set_pid_gains("arm", PidGains { p: 1.2, i: 0.0, d: 0.05 }).unwrap());
    assert!(client.publish_llm_answer("tune d first").unwrap());

    assert_eq!(
        server.sent_events(),
        vec![
            ("slider_update".to_string(), json!({"widget_id": "Slider_0", "values": [0.25, 0.75]})),
            ("pid_update".to_string(), json!({"widget_id": "arm", "p": 1.2, "i": 0.0, "d": 0.05})),
            ("llm_answer_update".to_string(), json!({"answer": "tune d first"})),
        ]
    );
}

#[test]
fn offline_control_changes_stay_local() {
    let (mut client, server) = client_with(Box::new(UnavailableRuntime));
    client.create_widget(WidgetKind::Slider, None).unwrap();

    assert!(!client.set_slider_values("Slider_0", vec![3.0]).unwrap());
    assert!(server.sent_events().is_empty());
    let slider = client.context().registry.lookup("Slider_0").unwrap();
    assert!(matches!(&slider.surface.content, Content::Slider { values, .. } if values == &vec![3.0]));
}

#[test]
fn controls_check_widget_kind() {
    let (mut client, _server, _) = connected_client();
    client.create_widget(WidgetKind::Text, None).unwrap();

    assert!(matches!(
        client.set_slider_values("Text_0", vec![1.0]),
        Err(PanelError::KindMismatch { .. })
    ));
    assert!(matches!(
        client.set_pid_gains("missing", PidGains::default()),
        Err(PanelError::UnknownWidget(_))
    ));
}

#[test]
fn layout_survives_a_restart() {
    let saved = {
        let (mut client, _server) = client_with(Box::new(UnavailableRuntime));
        client.create_widget(WidgetKind::Slider, None).unwrap();
        client.create_widget(WidgetKind::Slider, None).unwrap();
        client.create_widget(WidgetKind::Pid, Some("arm")).unwrap();
        client.create_widget(WidgetKind::Image, None).unwrap();
        client.remove_widget("Slider_0").unwrap();
        client.set_slider_values("Slider_1", vec![0.5]).unwrap();
        client.set_pid_gains("arm", PidGains { p: 2.0, i: 0.5, d: 0.1 }).unwrap();
        client.save_layout().unwrap()
    };

    let (mut client, _server) = client_with(Box::new(UnavailableRuntime));
    let restored = client.restore_layout(&saved).unwrap();
    let ids: Vec<&str> = restored.iter().map(|id| id.as_str()).collect();
    assert_eq!(ids, vec!["Slider_1", "arm", "Image_0"]);

    let registry = &client.context().registry;
    assert!(matches!(
        &registry.lookup("Slider_1").unwrap().surface.content,
        Content::Slider { values, .. } if values == &vec![0.5]
    ));
    assert!(matches!(
        &registry.lookup("arm").unwrap().surface.content,
        Content::Pid { gains, .. } if *gains == PidGains { p: 2.0, i: 0.5, d: 0.1 }
    ));

    // 自动编号从保存时的计数继续，不复用已删除的ID
    let next = client.create_widget(WidgetKind::Slider, None).unwrap();
    assert_eq!(next.as_str(), "Slider_2");
}

#[test]
fn corrupted_layout_is_rejected() {
    let (mut client, _server) = client_with(Box::new(UnavailableRuntime));
    assert!(client.restore_layout("{not json").is_err());
    assert!(client.context().registry.is_empty());
}

#[test]
fn renaming_onto_a_live_id_fails() {
    let (mut client, _server) = client_with(Box::new(UnavailableRuntime));
    client.create_widget(WidgetKind::Text, None).unwrap();
    client.create_widget(WidgetKind::Text, None).unwrap();

    assert!(matches!(
        client.rename_widget("Text_0", "Text_1"),
        Err(PanelError::DuplicateWidget(_))
    ));
    assert!(!client.rename_widget("Text_0", "  ").unwrap());
    assert!(!client.rename_widget("Text_0", "Text_0").unwrap());
}
