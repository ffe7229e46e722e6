//! Off-UI-thread execution for the two asynchronous jobs the widget has:
//! fetching sprite assets and the send call.
//!
//! Native runs each task on its own thread with a current-thread tokio
//! runtime (reqwest needs a reactor); the web build hands it to the browser's
//! microtask queue.

use std::future::Future;

#[cfg(not(target_arch = "wasm32"))]
pub type TaskFuture<T> = futures::future::BoxFuture<'static, T>;

#[cfg(target_arch = "wasm32")]
pub type TaskFuture<T> = futures::future::LocalBoxFuture<'static, T>;

#[cfg(not(target_arch = "wasm32"))]
pub fn boxed<F>(future: F) -> TaskFuture<F::Output>
where
    F: Future + Send + 'static,
{
    use futures::FutureExt as _;
    future.boxed()
}

#[cfg(target_arch = "wasm32")]
pub fn boxed<F>(future: F) -> TaskFuture<F::Output>
where
    F: Future + 'static,
{
    use futures::FutureExt as _;
    future.boxed_local()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn spawn(name: &str, task: TaskFuture<()>) {
    let spawned = std::thread::Builder::new()
        .name(name.to_owned())
        .spawn(move || {
            match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt.block_on(task),
                Err(err) => log::error!("Failed to start task runtime: {err}"),
            }
        });
    if let Err(err) = spawned {
        log::error!("Failed to spawn {name}: {err}");
    }
}

#[cfg(target_arch = "wasm32")]
pub fn spawn(name: &str, task: TaskFuture<()>) {
    log::debug!("Spawning {name}");
    wasm_bindgen_futures::spawn_local(task);
}
