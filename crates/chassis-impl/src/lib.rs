//! # Chassis 容器引擎
//!
//! 提供容器契约的具体实现：
//!
//! - [`MutableContext`] - 默认容器（有序注册表 + 注册观察者）
//! - [`StandardLifecycle`] - 生命周期协调器（两阶段驱动、环检测、
//!   获取顺序记录与逆序销毁）
//! - [`TwoPhaseInitializer`] - 内置观察者，桥接组件自带的
//!   pre-init / post-init / pre-destroy 钩子
//! - [`AutowiringProcessor`] - 自动装配处理器
//! - [`ForkedLifecycle`] / [`fork_context`] - 父子容器分叉支持
//!
//! ## 典型用法
//!
//! ```
//! use chassis_abstractions::{Context, ContextExt};
//! use chassis_impl::default_context;
//!
//! # fn main() -> chassis_common::ContextResult<()> {
//! let ctx = default_context()?;
//! ctx.register_component("hello".to_string())?;
//! ctx.start()?;
//! ctx.stop()?;
//! # Ok(())
//! # }
//! ```

pub mod autowiring;
pub mod context;
pub mod forked;
pub mod lifecycle;

pub use autowiring::AutowiringProcessor;
pub use context::{default_context, standard_context, MutableContext};
pub use forked::{fork_context, ForkedLifecycle};
pub use lifecycle::{StandardLifecycle, TwoPhaseInitializer};
