//! # Chassis Composition
//!
//! 容器的外部协作者，只经由容器的公共注册/查找/生命周期契约工作：
//!
//! - [`ComponentModule`] / [`fast_boot`] - 声明式"组件结构体"引导
//! - [`ConversionService`] / [`GenericConversionService`] - 可插拔的
//!   类型转换注册表（转换器本身以容器组件的身份被收集）

pub mod conversion;
pub mod declarative;

pub use conversion::*;
pub use declarative::*;
