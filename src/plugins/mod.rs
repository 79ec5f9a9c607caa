pub mod traits;
pub mod manager;
pub mod probes;
pub mod notifiers;

pub use manager::NotifierSet;
pub use traits::{NotifierSink, PageProbe, ProbeResult, ProbeSession, PurchaseAlert};
