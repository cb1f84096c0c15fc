pub mod binding;
pub mod dispatcher;
pub mod queue;
pub mod registry;

pub use binding::{bind_worker, BoundWorker, WORKER_TYPE};
pub use dispatcher::{Invocation, WorkerDispatcher};
pub use queue::{InMemoryQueue, InMemoryWorkerHandle};
pub use registry::ExecutorRegistry;
