//! 元数据定义
//!
//! 提供组件和能力契约的运行时类型描述符

use std::any::TypeId;
use std::fmt;

/// 类型信息
///
/// 同时覆盖具体类型和非定长类型（`dyn Trait`），后者用于描述能力契约。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    /// 完整类型路径
    pub name: String,
    /// 类型ID
    pub id: TypeId,
}

impl TypeInfo {
    /// 从类型获取类型信息
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            name: std::any::type_name::<T>().to_string(),
            id: TypeId::of::<T>(),
        }
    }

    /// 获取简短的类型名称（不包含模块路径）
    pub fn short_name(&self) -> &str {
        // 泛型参数内部的 "::" 不参与截断
        let head = self.name.split('<').next().unwrap_or(&self.name);
        let offset = head.rfind("::").map_or(0, |i| i + 2);
        &self.name[offset..]
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
