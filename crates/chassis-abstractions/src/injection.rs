//! 依赖注入槽与注入点
//!
//! Rust 没有字段反射，组件通过 [`Autowired`] 契约把自己的注入点
//! 枚举出来：每个注入点 = (字段名, 指令形式, 查询的能力契约,
//! 类型擦除的写入器)。类型化的槽 [`Injected`] / [`InjectedAll`]
//! 提供与值无关的写入器实现。指令在 prepare 阶段被读取一次，
//! 解析完成后不再重估。

use crate::component::CapabilityBinding;
use chassis_common::{DependencyError, DependencyResult, TypeInfo};
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

/// 注入指令形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionDirective {
    /// 按类型解析恰好一个匹配
    ByType,
    /// 按类型解析零或多个匹配，物化为有序序列
    ByTypeCollection,
}

/// 类型擦除的注入写入器
pub trait InjectionTarget: Sync {
    /// 将解析出的候选写入目标字段
    ///
    /// 候选数量的校验（单值/集合语义）由自动装配处理器完成，
    /// 写入器只负责类型化赋值。
    fn assign(
        &self,
        component: &TypeInfo,
        field: &'static str,
        candidates: &[CapabilityBinding],
    ) -> DependencyResult<()>;
}

/// 单值注入槽
///
/// 字段形如 `dao: Injected<dyn Dao>`；能力契约 `Q` 必须是
/// `Send + Sync` 的，才能在组件间共享句柄。
pub struct Injected<Q: ?Sized + 'static> {
    slot: OnceCell<Arc<Q>>,
}

impl<Q: ?Sized + 'static> Injected<Q> {
    /// 创建空槽
    pub fn new() -> Self {
        Self {
            slot: OnceCell::new(),
        }
    }

    /// 取出已装配的句柄；装配前为 `None`
    pub fn get(&self) -> Option<&Arc<Q>> {
        self.slot.get()
    }
}

impl<Q: ?Sized + Send + Sync + 'static> Injected<Q> {
    /// 把槽描述为一个 by-type 注入点
    pub fn point(&self, field: &'static str) -> InjectionPoint<'_> {
        InjectionPoint {
            field,
            directive: InjectionDirective::ByType,
            query: TypeInfo::of::<Q>(),
            target: self,
        }
    }
}

impl<Q: ?Sized + 'static> Default for Injected<Q> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Q: ?Sized + 'static> fmt::Debug for Injected<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injected")
            .field("query", &std::any::type_name::<Q>())
            .field("wired", &self.slot.get().is_some())
            .finish()
    }
}

impl<Q: ?Sized + Send + Sync + 'static> InjectionTarget for Injected<Q> {
    fn assign(
        &self,
        component: &TypeInfo,
        field: &'static str,
        candidates: &[CapabilityBinding],
    ) -> DependencyResult<()> {
        let binding = candidates
            .first()
            .ok_or_else(|| DependencyError::ComponentNotFound {
                type_name: TypeInfo::of::<Q>().name,
            })?;
        let value = typed(component, binding)?;
        self.slot
            .set(value)
            .map_err(|_| DependencyError::FieldNotSettable {
                component: component.name.clone(),
                field: field.to_string(),
            })
    }
}

/// 集合注入槽
///
/// 字段形如 `converters: InjectedAll<dyn Converter>`；
/// 零个匹配装配为空序列，不是错误。
pub struct InjectedAll<Q: ?Sized + 'static> {
    slot: OnceCell<Vec<Arc<Q>>>,
}

impl<Q: ?Sized + 'static> InjectedAll<Q> {
    /// 创建空槽
    pub fn new() -> Self {
        Self {
            slot: OnceCell::new(),
        }
    }

    /// 取出已装配的序列；装配前为 `None`
    pub fn get(&self) -> Option<&[Arc<Q>]> {
        self.slot.get().map(Vec::as_slice)
    }

    /// 遍历已装配的句柄；装配前迭代器为空
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Q>> {
        self.slot.get().into_iter().flatten()
    }
}

impl<Q: ?Sized + Send + Sync + 'static> InjectedAll<Q> {
    /// 把槽描述为一个 by-type-collection 注入点
    pub fn point(&self, field: &'static str) -> InjectionPoint<'_> {
        InjectionPoint {
            field,
            directive: InjectionDirective::ByTypeCollection,
            query: TypeInfo::of::<Q>(),
            target: self,
        }
    }
}

impl<Q: ?Sized + 'static> Default for InjectedAll<Q> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Q: ?Sized + 'static> fmt::Debug for InjectedAll<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectedAll")
            .field("query", &std::any::type_name::<Q>())
            .field("wired", &self.slot.get().is_some())
            .finish()
    }
}

impl<Q: ?Sized + Send + Sync + 'static> InjectionTarget for InjectedAll<Q> {
    fn assign(
        &self,
        component: &TypeInfo,
        field: &'static str,
        candidates: &[CapabilityBinding],
    ) -> DependencyResult<()> {
        let values = candidates
            .iter()
            .map(|binding| typed(component, binding))
            .collect::<DependencyResult<Vec<Arc<Q>>>>()?;
        self.slot
            .set(values)
            .map_err(|_| DependencyError::FieldNotSettable {
                component: component.name.clone(),
                field: field.to_string(),
            })
    }
}

fn typed<Q: ?Sized + 'static>(
    component: &TypeInfo,
    binding: &CapabilityBinding,
) -> DependencyResult<Arc<Q>> {
    binding
        .downcast::<Q>()
        .ok_or_else(|| DependencyError::MissingCapability {
            type_name: component.name.clone(),
            capability: TypeInfo::of::<Q>().name,
        })
}

/// 注入点
///
/// 组件一条待装配字段的声明式描述，借用着组件自身的槽。
pub struct InjectionPoint<'a> {
    field: &'static str,
    directive: InjectionDirective,
    query: TypeInfo,
    target: &'a dyn InjectionTarget,
}

impl InjectionPoint<'_> {
    /// 字段名（用于错误归因）
    pub fn field(&self) -> &'static str {
        self.field
    }

    /// 指令形式
    pub fn directive(&self) -> InjectionDirective {
        self.directive
    }

    /// 查询的能力契约
    pub fn query(&self) -> &TypeInfo {
        &self.query
    }

    /// 将候选写入字段
    pub fn assign(
        &self,
        component: &TypeInfo,
        candidates: &[CapabilityBinding],
    ) -> DependencyResult<()> {
        self.target.assign(component, self.field, candidates)
    }
}

impl fmt::Debug for InjectionPoint<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectionPoint")
            .field("field", &self.field)
            .field("directive", &self.directive)
            .field("query", &self.query.name)
            .finish()
    }
}

/// 自动装配契约
///
/// 组件声明自己的注入点清单；自动装配处理器在 prepare 阶段
/// 读取一次并据此驱动解析与赋值。
pub trait Autowired: Send + Sync {
    /// 枚举全部注入点
    fn injection_points(&self) -> Vec<InjectionPoint<'_>>;
}
