use serde::{Deserialize, Serialize};

/// 用户可见提示文本的语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ko,
}

/// 提示文本键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    ServerConnected,
    ServerDisconnected,
    ConnectionNotReady,
    ConnectionFailed,
    CodeEmpty,
    ExecutionStarted,
    ExecutionStopping,
    ExecutionStopped,
    ExecutionCompleted,
    ExecutionError,
    ExecutionNotRunning,
    ExecutionEnded,
    ImageLoadFailed,
    ImagePlaceholder,
    WebcamPlaceholder,
    WebcamAlreadyExists,
    CameraNotFound,
    CameraFallback,
    CameraPermissionDenied,
    CameraInsecureContext,
    CameraBusy,
    CameraGeneric,
    GestureLoadFailed,
}

/// 获取本地化提示文本
pub fn text(locale: Locale, key: MessageKey) -> &'static str {
    match locale {
        Locale::En => english(key),
        Locale::Ko => korean(key),
    }
}

fn english(key: MessageKey) -> &'static str {
    match key {
        MessageKey::ServerConnected => "Connected to the server.",
        MessageKey::ServerDisconnected => "Disconnected from the server.",
        MessageKey::ConnectionNotReady => "Connection is not ready. Retrying shortly...",
        MessageKey::ConnectionFailed => "Connection failed. Please reconnect and try again.",
        MessageKey::CodeEmpty => "There is no code to run.",
        MessageKey::ExecutionStarted => "Program started.",
        MessageKey::ExecutionStopping => "Stopping the program...",
        MessageKey::ExecutionStopped => "Program stopped.",
        MessageKey::ExecutionCompleted => "Program finished.",
        MessageKey::ExecutionError => "Program failed: ",
        MessageKey::ExecutionNotRunning => "No program is running.",
        MessageKey::ExecutionEnded => "execution ended",
        MessageKey::ImageLoadFailed => "Failed to load image",
        MessageKey::ImagePlaceholder => "No image loaded",
        MessageKey::WebcamPlaceholder => "The webcam will appear here",
        MessageKey::WebcamAlreadyExists => "A webcam widget already exists.",
        MessageKey::CameraNotFound => "No connected camera was found.",
        MessageKey::CameraFallback => "The selected camera was not found; connected to the default device.",
        MessageKey::CameraPermissionDenied => "Camera permission was denied. Allow camera access and try again.",
        MessageKey::CameraInsecureContext => "Cameras are only available from a secure context (HTTPS or localhost).",
        MessageKey::CameraBusy => "Another program is using the camera. Close it and try again.",
        MessageKey::CameraGeneric => "Could not access the webcam. Check permissions and the device.",
        MessageKey::GestureLoadFailed => "Failed to load the gesture recognizer.",
    }
}

fn korean(key: MessageKey) -> &'static str {
    match key {
        MessageKey::ServerConnected => "서버에 연결되었습니다.",
        MessageKey::ServerDisconnected => "서버와의 연결이 끊어졌습니다.",
        MessageKey::ConnectionNotReady => "연결이 준비되지 않았습니다. 잠시 후 다시 시도합니다.",
        MessageKey::ConnectionFailed => "연결에 실패했습니다. 다시 연결한 후 시도해주세요.",
        MessageKey::CodeEmpty => "실행할 코드가 없습니다.",
        MessageKey::ExecutionStarted => "코드 실행을 시작합니다.",
        MessageKey::ExecutionStopping => "코드 실행을 중지합니다...",
        MessageKey::ExecutionStopped => "코드 실행이 중지되었습니다.",
        MessageKey::ExecutionCompleted => "코드 실행이 완료되었습니다.",
        MessageKey::ExecutionError => "코드 실행 중 오류가 발생했습니다: ",
        MessageKey::ExecutionNotRunning => "실행 중인 코드가 없습니다.",
        MessageKey::ExecutionEnded => "execution ended",
        MessageKey::ImageLoadFailed => "이미지를 불러오지 못했습니다",
        MessageKey::ImagePlaceholder => "이미지가 없습니다",
        MessageKey::WebcamPlaceholder => "웹캠이 여기에 표시됩니다",
        MessageKey::WebcamAlreadyExists => "이미 웹캠 위젯이 생성되어 있습니다.",
        MessageKey::CameraNotFound => "연결된 카메라를 찾을 수 없습니다.",
        MessageKey::CameraFallback => "선택한 카메라를 찾을 수 없어 기본 장치로 연결했습니다.",
        MessageKey::CameraPermissionDenied => "카메라 권한이 거부되었습니다. 권한을 허용하세요.",
        MessageKey::CameraInsecureContext => "보안 맥락(HTTPS/localhost)에서만 카메라 사용이 가능합니다.",
        MessageKey::CameraBusy => "다른 프로그램이 카메라를 사용 중입니다. 해당 프로그램을 종료 후 다시 시도하세요.",
        MessageKey::CameraGeneric => "웹캠 접근에 실패했습니다. 권한과 장치를 확인하세요.",
        MessageKey::GestureLoadFailed => "제스처 인식기를 불러오지 못했습니다.",
    }
}
