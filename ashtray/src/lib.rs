//! Vulkanのオブジェクトに対するdestroy処理を忘れたりすることをなくすために用意したラッパーライブラリ。
//! Vulkanの各Objectを参照カウンタで管理して、参照がすべて破棄された際に
//! 自動で各種destroy処理を行うようにしたラッパーの構造体の各種Handleが用意されている。
//!
//! 各Handleは作成元のHandleをcloneして保持するので、
//! 子のオブジェクトが生きている間に親のオブジェクトが破棄されることはない。
//! 途中で作成に失敗した場合も、それまでに作成したHandleがdropされて破棄される。
//!
//! 基本的にHandle系の構造体は元のVulkanのオブジェクトのメソッドを引き継いでいる。
//! Vulkanの標準以上の便利メソッドはutilsの中で提供する方針。
#![warn(missing_docs)]

pub mod handles;
pub use handles::*;

pub mod utils;
