pub mod clock;
pub mod generator;
pub mod link_registry;

pub use clock::{Clock, ManualClock, SystemClock};
pub use generator::{CodeGenerator, RandomCodeGenerator, URL_SAFE_ALPHABET};
pub use link_registry::{LinkRegistry, RegistryError, RegistryResult};
