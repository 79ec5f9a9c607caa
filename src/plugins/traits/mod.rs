pub mod probe;
pub mod notifier;

pub use probe::{PageProbe, ProbeSession, ProbeResult};
pub use notifier::{NotifierSink, PurchaseAlert};
