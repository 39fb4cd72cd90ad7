//! Domain types for cmdcast
//!
//! - [`Task`] / [`Instruction`] - what arrives on the bus
//! - [`NodeIdentity`] - who this agent is
//! - [`applies`] - whether a task targets this node

mod identity;
mod targeting;
mod task;

pub use identity::{DEFAULT_ROLE, NodeIdentity};
pub use targeting::{applies, id_matches, role_matches};
pub use task::{Instruction, Task, TaskDecodeError};
