//! # Utility functions and structs
//! Vulkanの本体には存在しないがあると便利なutilityの関数たち。
//!
//! physical deviceの選択やswapchainのformatの選択のような判断の部分は
//! Vulkanを呼ばずに済むように、取得済みの情報を受け取る純粋な関数にしてある。

mod setup;
pub use setup::*;
mod swapchain;
pub use swapchain::*;
mod pipeline;
pub use pipeline::*;
mod shader;
pub use shader::*;
