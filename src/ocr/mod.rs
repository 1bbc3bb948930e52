//! OCR drivers and their concurrency/pacing. The two phases share the
//! same `Limiter` shape but never the same `Limiter` instance — each is
//! scoped to its own fan-out, a single task scope that owns its own
//! semaphore.

mod concurrency;
mod driver_a;
mod driver_b;
mod retry;

pub use concurrency::Limiter;
pub use driver_a::run_ocr_a;
pub use driver_b::run_ocr_b;
pub use retry::call_with_retry;
