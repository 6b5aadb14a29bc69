// 集成测试共用的夹具
#![allow(dead_code)]

use std::io::Cursor;
use std::time::Instant;

use image::{ImageOutputFormat, Rgba, RgbaImage};
use panel_relay::gesture::UnavailableRuntime;
use panel_relay::gesture::VisionRuntimeLoader;
use panel_relay::transport::{memory_pair, MemoryServer};
use panel_relay::{ClientConfig, PanelClient};

pub fn config() -> ClientConfig {
    ClientConfig::builder().server_url("http://localhost:5000").build()
}

/// 未连接的客户端和它的对端
pub fn client_with(loader: Box<dyn VisionRuntimeLoader>) -> (PanelClient, MemoryServer) {
    let (link, server) = memory_pair();
    let client = PanelClient::new(&config(), Box::new(link), loader).expect("client");
    (client, server)
}

/// 已完成握手的客户端
pub fn connected_client() -> (PanelClient, MemoryServer, Instant) {
    let (mut client, server) = client_with(Box::new(UnavailableRuntime));
    let now = Instant::now();
    client.connect(now).expect("connect");
    server.accept("test-sid");
    client.pump(now);
    assert!(client.is_connected());
    (client, server, now)
}

/// 一张小的 PNG 图片，左上角像素颜色可区分
pub fn png(marker: [u8; 4]) -> Vec<u8> {
    let mut img = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 255]));
    img.put_pixel(0, 0, Rgba(marker));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut out, ImageOutputFormat::Png)
        .expect("encode png");
    out.into_inner()
}

/// 客户端发出的事件名
pub fn sent_names(server: &MemoryServer) -> Vec<String> {
    server.sent_events().into_iter().map(|(name, _)| name).collect()
}
