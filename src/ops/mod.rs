pub mod category_ops;
pub mod stats;
pub mod task_ops;
