use url::Url;

use crate::config::ServerConfig;
use crate::core::{PanelError, PanelResult};

/// 链路上的一帧数据
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

/// 持久双向连接的底层链路
///
/// 所有方法都是非阻塞的：`recv` 在没有数据时返回 `Ok(None)`。
pub trait Link {
    /// 建立连接
    fn open(&mut self, url: &Url) -> PanelResult<()>;

    /// 发送一帧
    fn send(&mut self, frame: Frame) -> PanelResult<()>;

    /// 读取一帧（无数据时返回 None，连接断开时返回错误）
    fn recv(&mut self) -> PanelResult<Option<Frame>>;

    /// 关闭连接
    fn close(&mut self);

    fn is_open(&self) -> bool;
}

/// 根据服务器配置构造 Socket.IO websocket 地址
pub fn socket_url(config: &ServerConfig) -> PanelResult<Url> {
    let mut url = Url::parse(&config.url)
        .map_err(|e| PanelError::Config(format!("invalid server url '{}': {}", config.url, e)))?;

    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(PanelError::Config(format!("unsupported url scheme '{}'", other))),
    };
    url.set_scheme(scheme)
        .map_err(|_| PanelError::Config(format!("cannot switch url scheme to {}", scheme)))?;

    let path = if config.socketio_path.ends_with('/') {
        config.socketio_path.clone()
    } else {
        format!("{}/", config.socketio_path)
    };
    url.set_path(&path);
    url.query_pairs_mut()
        .clear()
        .append_pair("EIO", "4")
        .append_pair("transport", "websocket");
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_socketio_url_from_http_address() {
        let config = ServerConfig {
            url: "http://192.168.0.7:5000".to_string(),
            ..ServerConfig::default()
        };
        let url = socket_url(&config).unwrap();
        assert_eq!(url.as_str(), "ws://192.168.0.7:5000/socket.io/?EIO=4&transport=websocket");
    }

    #[test]
    fn secure_scheme_is_preserved() {
        let config = ServerConfig {
            url: "https://robot.example".to_string(),
            socketio_path: "/socket.io".to_string(),
            ..ServerConfig::default()
        };
        assert!(socket_url(&config).unwrap().as_str().starts_with("wss://robot.example/socket.io/?"));
    }
}
