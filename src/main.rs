use std::{
    env, fs, process, thread,
    time::{Duration, Instant},
};

use panel_relay::gesture::UnavailableRuntime;
use panel_relay::{
    init_logging, ClientConfig, ConfigManager, ExecutionState, InboundEvent, PanelClient, WebSocketLink,
};

const POLL_INTERVAL: Duration = Duration::from_millis(16);

fn usage() -> ! {
    eprintln!("用法: panel_relay <server-url> <program-file> [config.toml]");
    process::exit(2);
}

fn load_config(path: Option<&String>) -> ClientConfig {
    match path {
        Some(path) => {
            let mut manager = ConfigManager::with_path(path);
            manager.load_or_default();
            manager.config().clone()
        }
        None => ClientConfig::default(),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        usage();
    }

    let mut config = load_config(args.get(3));
    config.server.url = args[1].clone();
    init_logging(&config.logging);

    let code = fs::read_to_string(&args[2])?;
    let mut client = PanelClient::new(&config, Box::new(WebSocketLink::new()), Box::new(UnavailableRuntime))?;

    // 程序输出直接打印到终端
    client.subscribe("stdout", |event, _| {
        if let InboundEvent::Stdout { text } = event {
            println!("{}", text);
        }
    });
    client.subscribe("stderr", |event, _| {
        if let InboundEvent::Stderr { text } = event {
            eprintln!("{}", text);
        }
    });

    client.connect(Instant::now())?;
    let deadline = Instant::now() + Duration::from_millis(config.server.connect_timeout_ms);
    while !client.is_connected() && Instant::now() < deadline {
        client.pump(Instant::now());
        thread::sleep(POLL_INTERVAL);
    }

    client.start(&code, Instant::now())?;
    println!("启动程序: {}", args[2]);

    // 单线程事件循环
    let exit_code = loop {
        let now = Instant::now();
        client.pump(now);
        client.on_animation_frame(now);

        match client.session_state() {
            ExecutionState::Finished => break 0,
            ExecutionState::Errored => {
                eprintln!("{}", client.status());
                break 1;
            }
            ExecutionState::Idle if !client.context().session.has_pending_retry() => {
                eprintln!("无法提交程序: 未连接到 {}", config.server.url);
                break 1;
            }
            _ => {}
        }
        thread::sleep(POLL_INTERVAL);
    };

    let stats = client.stats();
    log::info!(
        "结束: 收到 {} 个事件，发送 {} 个事件",
        stats.connection.events_received,
        stats.connection.events_sent
    );
    drop(client);
    process::exit(exit_code);
}
