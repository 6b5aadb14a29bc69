// 组件数据路由测试：二进制图像、旧版 base64、文本和自定义数据
mod common;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::Rgba;
use panel_relay::events::ImagePayload;
use panel_relay::resources::{HandleId, LifecycleAction, ResourceKind};
use panel_relay::{DispatchOutcome, InboundEvent, PanelClient, PanelError, WidgetKind};
use serde_json::json;

use common::{connected_client, png};

fn placeholder(num: usize) -> serde_json::Value {
    json!({"_placeholder": true, "num": num})
}

#[test]
fn binary_image_replaces_previous_handle() {
    let (mut client, server, now) = connected_client();
    client.create_widget(WidgetKind::Image, None).unwrap();

    server.emit_binary(
        "image_data",
        json!({"widget_id": "Image_0", "image": placeholder(0), "format": "png"}),
        vec![png([255, 0, 0, 255])],
    );
    client.pump(now);

    let ctx = client.context();
    let first = ctx.registry.lookup("Image_0").unwrap().surface.image().unwrap().handle.unwrap();
    assert!(ctx.resources.is_live(first));
    assert!(ctx.registry.lookup("Image_0").unwrap().surface.content_visible());

    server.emit_binary(
        "image_data",
        json!({"w": "Image_0", "i": placeholder(0), "f": "png"}),
        vec![png([0, 255, 0, 255])],
    );
    client.pump(now);

    let ctx = client.context();
    let image = ctx.registry.lookup("Image_0").unwrap().surface.image().unwrap();
    let second = image.handle.unwrap();
    assert_ne!(first, second);
    assert!(!ctx.resources.is_live(first));
    assert_eq!(ctx.resources.live_count("Image_0", ResourceKind::ImageBlob), 1);
    assert_eq!(image.pixels.as_ref().unwrap().get_pixel(0, 0), &Rgba([0, 255, 0, 255]));
}

fn send_png(server: &panel_relay::transport::MemoryServer, widget_id: &str, marker: [u8; 4]) {
    server.emit_binary(
        "image_data",
        json!({"widget_id": widget_id, "image": placeholder(0), "format": "png"}),
        vec![png(marker)],
    );
}

fn blob_journal(client: &PanelClient) -> Vec<(HandleId, String, LifecycleAction)> {
    client
        .context()
        .resources
        .journal()
        .filter(|record| record.kind == ResourceKind::ImageBlob)
        .map(|record| (record.handle, record.widget_id.clone(), record.action))
        .collect()
}

fn current_handle(client: &PanelClient, widget_id: &str) -> HandleId {
    client
        .context()
        .registry
        .lookup(widget_id)
        .and_then(|widget| widget.surface.image())
        .and_then(|image| image.handle)
        .expect("image handle")
}

#[test]
fn prior_image_is_revoked_only_after_the_next_one_loads() {
    let (mut client, server, now) = connected_client();
    client.create_widget(WidgetKind::Image, None).unwrap();

    send_png(&server, "Image_0", [255, 0, 0, 255]);
    client.pump(now);
    let first = current_handle(&client, "Image_0");

    send_png(&server, "Image_0", [0, 0, 255, 255]);
    client.pump(now);
    let second = current_handle(&client, "Image_0");

    let owner = "Image_0".to_string();
    assert_eq!(
        blob_journal(&client),
        vec![
            (first, owner.clone(), LifecycleAction::Acquired),
            (first, owner.clone(), LifecycleAction::Loaded),
            (second, owner.clone(), LifecycleAction::Acquired),
            (second, owner.clone(), LifecycleAction::Loaded),
            (first, owner, LifecycleAction::Released),
        ]
    );
}

#[test]
fn many_updates_leave_one_live_image() {
    let (mut client, server, now) = connected_client();
    client.create_widget(WidgetKind::Image, None).unwrap();

    let mut handles = Vec::new();
    for shade in 0..6u8 {
        send_png(&server, "Image_0", [shade * 40, 10, 10, 255]);
        client.pump(now);
        handles.push(current_handle(&client, "Image_0"));
        assert_eq!(client.context().resources.live_count("Image_0", ResourceKind::ImageBlob), 1);
    }

    let (latest, older) = handles.split_last().unwrap();
    assert!(client.context().resources.is_live(*latest));
    assert!(older.iter().all(|handle| !client.context().resources.is_live(*handle)));
    assert_eq!(client.context().resources.released_total(), 5);
}

#[test]
fn legacy_base64_image_is_embedded() {
    let (mut client, server, now) = connected_client();
    client.create_widget(WidgetKind::Image, Some("camera_view")).unwrap();

    let encoded = STANDARD.encode(png([1, 2, 3, 255]));
    server.emit("image_data", json!({"widget_id": "camera_view", "image": encoded, "format": "png"}));
    client.pump(now);

    let ctx = client.context();
    let image = ctx.registry.lookup("camera_view").unwrap().surface.image().unwrap();
    assert!(image.src.as_deref().unwrap().starts_with("data:image/png;base64,"));
    assert!(image.handle.is_none());
    assert_eq!(ctx.resources.live_count("camera_view", ResourceKind::ImageBlob), 0);
}

#[test]
fn unknown_widget_ids_are_dropped() {
    let (mut client, server, now) = connected_client();
    server.emit("text_data", json!({"widget_id": "Text_9", "text": "lost"}));
    client.pump(now);

    assert!(client.context().registry.is_empty());
    assert_eq!(client.context().router.stats().dropped, 1);
}

#[test]
fn undecodable_image_only_affects_its_widget() {
    let (mut client, server, now) = connected_client();
    client.create_widget(WidgetKind::Image, None).unwrap();
    client.create_widget(WidgetKind::Image, None).unwrap();

    server.emit_binary(
        "image_data",
        json!({"widget_id": "Image_1", "image": placeholder(0), "format": "png"}),
        vec![png([9, 9, 9, 255])],
    );
    server.emit("image_data", json!({"widget_id": "Image_0", "image": {"unexpected": true}}));
    server.emit_binary(
        "image_data",
        json!({"widget_id": "Image_1", "image": placeholder(0), "format": "png"}),
        vec![b"not an image".to_vec()],
    );
    client.pump(now);

    let ctx = client.context();
    let broken = ctx.registry.lookup("Image_0").unwrap();
    assert!(!broken.surface.content_visible());
    assert_eq!(broken.surface.placeholder.message, "Failed to load image");

    let failed = ctx.registry.lookup("Image_1").unwrap();
    assert!(failed.surface.image().unwrap().handle.is_none());
    assert_eq!(ctx.resources.live_count("Image_1", ResourceKind::ImageBlob), 0);
    assert_eq!(ctx.router.stats().failed, 2);
}

#[test]
fn text_and_custom_data_reach_matching_widgets() {
    let (mut client, server, now) = connected_client();
    client.create_widget(WidgetKind::Text, None).unwrap();
    client.create_widget(WidgetKind::Image, None).unwrap();

    server.emit("text_data", json!({"widget_id": "Text_0", "text": 42}));
    server.emit("text_data", json!({"widget_id": "Image_0", "text": "wrong kind"}));
    server.emit("custom_data", json!({"widget_id": "Text_0", "text": "custom"}));
    server.emit("custom_data", json!({"status": "idle"}));
    client.pump(now);

    let ctx = client.context();
    assert_eq!(ctx.registry.lookup("Text_0").unwrap().surface.text(), Some("custom"));
    assert!(ctx.registry.lookup("Image_0").unwrap().surface.image().unwrap().src.is_none());
    assert_eq!(ctx.router.custom_events().count(), 1);
    assert_eq!(ctx.router.stats().dropped, 1);
}

#[test]
fn renamed_widget_receives_data_under_new_id() {
    let (mut client, server, now) = connected_client();
    client.create_widget(WidgetKind::Text, None).unwrap();
    assert!(client.rename_widget("Text_0", "speed").unwrap());

    server.emit("text_data", json!({"widget_id": "Text_0", "text": "old"}));
    server.emit("text_data", json!({"widget_id": "speed", "text": "12 km/h"}));
    client.pump(now);

    let ctx = client.context();
    assert!(ctx.registry.lookup("Text_0").is_none());
    assert_eq!(ctx.registry.lookup("speed").unwrap().surface.text(), Some("12 km/h"));
}

#[test]
fn renamed_image_widget_keeps_its_handle_chain() {
    let (mut client, server, now) = connected_client();
    client.create_widget(WidgetKind::Image, Some("front")).unwrap();
    send_png(&server, "front", [1, 1, 1, 255]);
    client.pump(now);
    let before = current_handle(&client, "front");

    assert!(client.rename_widget("front", "rear").unwrap());
    assert_eq!(client.context().resources.owner(before), Some("rear"));

    send_png(&server, "rear", [2, 2, 2, 255]);
    client.pump(now);
    let after = current_handle(&client, "rear");
    assert_ne!(before, after);
    assert!(!client.context().resources.is_live(before));
    assert!(blob_journal(&client).contains(&(before, "rear".to_string(), LifecycleAction::Released)));
    assert_eq!(client.context().resources.live_count("rear", ResourceKind::ImageBlob), 1);

    let dropped = client.context().router.stats().dropped;
    let outcome = client.context_mut().route(&InboundEvent::Image {
        widget_id: "front".to_string(),
        payload: ImagePayload::Bytes(png([3, 3, 3, 255])),
        format: Some("png".to_string()),
    });
    assert!(matches!(outcome, DispatchOutcome::Dropped(PanelError::UnknownWidget(ref id)) if id == "front"));
    assert_eq!(client.context().router.stats().dropped, dropped + 1);
    assert_eq!(current_handle(&client, "rear"), after);
    assert_eq!(client.context().resources.live_count("front", ResourceKind::ImageBlob), 0);
}

#[test]
fn removing_a_widget_revokes_its_image() {
    let (mut client, server, now) = connected_client();
    client.create_widget(WidgetKind::Image, None).unwrap();
    server.emit_binary(
        "image_data",
        json!({"widget_id": "Image_0", "image": placeholder(0), "format": "png"}),
        vec![png([5, 5, 5, 255])],
    );
    client.pump(now);
    assert_eq!(client.stats().live_resources, 1);

    client.remove_widget("Image_0").unwrap();
    assert_eq!(client.stats().live_resources, 0);
    assert_eq!(client.stats().widgets, 0);
}
