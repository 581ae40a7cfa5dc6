pub mod runtime;
pub mod timer;

pub use runtime::EventLoop;
pub use timer::SpinTimer;
