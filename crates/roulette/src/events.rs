use crate::spin::SpinId;

#[derive(Debug, Clone)]
pub enum AppEvent {
    Input(String),
    InputClosed,
    SpinFinished(SpinId),
    ConfigReload,
}
