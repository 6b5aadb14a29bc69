use std::io;
use std::net::TcpStream;

use tungstenite::{client::IntoClientRequest, stream::MaybeTlsStream, Message, WebSocket};
use url::Url;

use super::link::{Frame, Link};
use crate::core::{PanelError, PanelResult};

/// 基于 tungstenite 的非阻塞 websocket 链路
pub struct WebSocketLink {
    socket: Option<WebSocket<MaybeTlsStream<TcpStream>>>,
    total_frames_received: u64,
    total_bytes_received: u64,
}

impl WebSocketLink {
    pub fn new() -> Self {
        Self {
            socket: None,
            total_frames_received: 0,
            total_bytes_received: 0,
        }
    }

    pub fn total_bytes_received(&self) -> u64 {
        self.total_bytes_received
    }

    /// 设置非阻塞模式
    fn set_nonblocking(socket: &WebSocket<MaybeTlsStream<TcpStream>>) -> io::Result<()> {
        match socket.get_ref() {
            MaybeTlsStream::Plain(tcp_stream) => tcp_stream.set_nonblocking(true),
            MaybeTlsStream::NativeTls(tls_stream) => tls_stream.get_ref().set_nonblocking(true),
            _ => Ok(()),
        }
    }

    fn lost(&mut self, error: tungstenite::Error) -> PanelError {
        self.socket = None;
        PanelError::Connection(error.to_string())
    }
}

impl Default for WebSocketLink {
    fn default() -> Self {
        Self::new()
    }
}

impl Link for WebSocketLink {
    fn open(&mut self, url: &Url) -> PanelResult<()> {
        log::info!("正在连接到: {}", url);

        let request = url
            .as_str()
            .into_client_request()
            .map_err(|e| PanelError::Connection(e.to_string()))?;
        let (socket, response) =
            tungstenite::client::connect(request).map_err(|e| PanelError::Connection(e.to_string()))?;
        log::info!("WebSocket连接响应状态: {}", response.status());

        Self::set_nonblocking(&socket).map_err(|e| PanelError::Connection(e.to_string()))?;
        self.socket = Some(socket);
        Ok(())
    }

    fn send(&mut self, frame: Frame) -> PanelResult<()> {
        let socket = self
            .socket
            .as_mut()
            .ok_or_else(|| PanelError::Connection("WebSocket未连接".to_string()))?;
        let message = match frame {
            Frame::Text(text) => Message::Text(text),
            Frame::Binary(bytes) => Message::Binary(bytes),
        };
        match socket.send(message) {
            Ok(()) => Ok(()),
            // 已进入写缓冲区，下次读取时刷新
            Err(tungstenite::Error::Io(ref e)) if e.kind() == io::ErrorKind::WouldBlock => Ok(()),
            Err(e) => Err(self.lost(e)),
        }
    }

    fn recv(&mut self) -> PanelResult<Option<Frame>> {
        let Some(socket) = self.socket.as_mut() else {
            return Ok(None);
        };

        if let Err(e) = socket.flush() {
            match e {
                tungstenite::Error::Io(ref io_err) if io_err.kind() == io::ErrorKind::WouldBlock => {}
                other => return Err(self.lost(other)),
            }
        }

        loop {
            let socket = match self.socket.as_mut() {
                Some(socket) => socket,
                None => return Ok(None),
            };
            match socket.read() {
                Ok(Message::Text(text)) => {
                    self.total_frames_received += 1;
                    self.total_bytes_received += text.len() as u64;
                    return Ok(Some(Frame::Text(text)));
                }
                Ok(Message::Binary(data)) => {
                    self.total_frames_received += 1;
                    self.total_bytes_received += data.len() as u64;
                    log::debug!("收到二进制帧: {} 字节", data.len());
                    return Ok(Some(Frame::Binary(data)));
                }
                Ok(Message::Close(frame)) => {
                    log::warn!("WebSocket连接已关闭: {:?}", frame);
                    self.socket = None;
                    return Err(PanelError::Connection("connection closed by server".to_string()));
                }
                // websocket 层的 ping/pong 由 tungstenite 自动应答
                Ok(_) => continue,
                Err(tungstenite::Error::Io(ref e)) if e.kind() == io::ErrorKind::WouldBlock => {
                    return Ok(None);
                }
                Err(e) => return Err(self.lost(e)),
            }
        }
    }

    fn close(&mut self) {
        if let Some(mut socket) = self.socket.take() {
            let _ = socket.close(None);
            let _ = socket.flush();
        }
        log::info!(
            "WebSocket连接已断开，共收到 {} 帧",
            self.total_frames_received
        );
    }

    fn is_open(&self) -> bool {
        self.socket.is_some()
    }
}
