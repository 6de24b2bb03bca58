//! Outermost guard between the query loop and the process exit code.

use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tracing::error;
use tracing::level_filters::LevelFilter;

use crate::error::ProbeError;
use crate::logging;

/// Drive `work` to its exit code. A panic inside it is logged as a single
/// `panic in main` record and mapped to the fault exit code.
pub async fn guard<F>(work: F) -> i32
where
    F: Future<Output = i32>,
{
    match AssertUnwindSafe(work).catch_unwind().await {
        Ok(code) => code,
        Err(payload) => {
            logging::init(LevelFilter::INFO);
            let fault = ProbeError::Fault(panic_message(payload.as_ref()));
            error!(error = %fault, error_kind = fault.kind(), "panic in main");
            fault.exit_code()
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
