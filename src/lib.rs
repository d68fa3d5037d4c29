pub mod collector;
pub mod comm;
pub mod config;
pub mod coordinator;
pub mod distributor;
pub mod error;
pub mod inputs;
pub mod kernel;
pub mod launch;
pub mod matrix;
pub mod observability;
pub mod output;
pub mod participant;
pub mod partition;
pub mod round;
pub mod slice;
pub mod worker;

pub use comm::{Communicator, LocalCommunicator, ROOT};
pub use config::{Dimensions, InputSource, RunConfig};
pub use coordinator::Coordinator;
pub use error::{MatmulError, Result};
pub use launch::run_local;
pub use matrix::{Element, Matrix};
pub use participant::Participant;
pub use partition::{plan, PartitionPlan, RowSpan};
pub use worker::Worker;
