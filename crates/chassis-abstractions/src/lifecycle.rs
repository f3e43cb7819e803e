//! 组件生命周期契约
//!
//! 生命周期协调器按 prepare → ready 两个阶段驱动每个组件恰好一次，
//! 记录获取顺序，并在销毁时逆序回放。状态机与观察者契约在此定义，
//! 具体协调器实现位于 `chassis-impl`。

use crate::component::ComponentRecord;
use chassis_common::{ContextResult, DependencyError, DependencyResult, TypeInfo};
use std::any::TypeId;
use std::sync::Arc;

/// 组件生命周期状态
///
/// `Resolving` 状态的组件被再次访问即为依赖环，属于硬失败；
/// `Resolved` 状态的组件被再次访问是幂等跳过（菱形依赖安全）。
/// `Destroyed` 是显式终态，保证重复 `stop()` 不会二次销毁。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    /// 尚未配置
    #[default]
    Unconfigured,
    /// 正在解析（首次访问后、两阶段完成前）
    Resolving,
    /// 解析完成
    Resolved,
    /// 已销毁（终态）
    Destroyed,
}

/// 生命周期观察者契约
///
/// 对每个组件依次回调 prepare / ready / destroy 三个钩子。
/// 自动装配处理器与两阶段初始化器都是该契约的实现；
/// 外部协作者同样可以挂接自己的观察者。
pub trait LifecycleObserver: Send + Sync {
    /// 第一初始化阶段：组件作为类型被配置（自动装配发生在这里）
    fn on_prepare(&self, record: &Arc<ComponentRecord>) -> ContextResult<()> {
        let _ = record;
        Ok(())
    }

    /// 第二初始化阶段：组件作为容器成员被配置
    fn on_ready(&self, record: &Arc<ComponentRecord>) -> ContextResult<()> {
        let _ = record;
        Ok(())
    }

    /// 销毁阶段
    fn on_destroy(&self, record: &Arc<ComponentRecord>) -> ContextResult<()> {
        let _ = record;
        Ok(())
    }
}

/// 组件配置器契约
///
/// 驱动单个组件完成全部生命周期阶段；自动装配处理器借助它
/// 递归触发依赖组件的解析（依赖环也在这条递归路径上被发现）。
pub trait ComponentConfigurer: Send + Sync {
    /// 确保记录达到 `Resolved` 状态
    fn configure_component(&self, record: &Arc<ComponentRecord>) -> ContextResult<()>;
}

/// 组件查找契约
///
/// 分叉容器通过实现该契约把本地未命中的查询委托给父容器，
/// 对自动装配处理器完全透明。
pub trait ComponentLookup: Send + Sync {
    /// 返回满足能力契约的全部记录，按注册表顺序；空结果合法
    fn find_by_type_id(&self, query: TypeId) -> Vec<Arc<ComponentRecord>>;
}

/// 查找泛型便捷方法
pub trait LookupExt: ComponentLookup {
    /// 按能力契约查找全部记录
    fn find_by_type<Q: ?Sized + 'static>(&self) -> Vec<Arc<ComponentRecord>> {
        self.find_by_type_id(TypeId::of::<Q>())
    }

    /// 要求恰好一条匹配记录
    fn find_single<Q: ?Sized + 'static>(&self) -> DependencyResult<Arc<ComponentRecord>> {
        let mut found = self.find_by_type::<Q>();
        match found.len() {
            1 => Ok(found.remove(0)),
            0 => Err(DependencyError::ComponentNotFound {
                type_name: TypeInfo::of::<Q>().name,
            }),
            count => Err(DependencyError::AmbiguousComponent {
                type_name: TypeInfo::of::<Q>().name,
                count,
            }),
        }
    }

    /// 解析唯一匹配组件的类型化能力句柄
    fn resolve<Q: ?Sized + 'static>(&self) -> DependencyResult<Arc<Q>> {
        let record = self.find_single::<Q>()?;
        typed_capability(&record)
    }

    /// 解析全部匹配组件的类型化能力句柄，按注册表顺序
    fn resolve_all<Q: ?Sized + 'static>(&self) -> DependencyResult<Vec<Arc<Q>>> {
        self.find_by_type::<Q>().iter().map(typed_capability).collect()
    }
}

impl<L: ComponentLookup + ?Sized> LookupExt for L {}

fn typed_capability<Q: ?Sized + 'static>(
    record: &Arc<ComponentRecord>,
) -> DependencyResult<Arc<Q>> {
    record
        .capability::<Q>()
        .ok_or_else(|| DependencyError::MissingCapability {
            type_name: record.type_info().name.clone(),
            capability: TypeInfo::of::<Q>().name,
        })
}

/// 钩子错误类型
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// prepare 阶段初始化钩子
///
/// 普通组件通过实现该契约（并在注册时声明）参与生命周期，
/// 而不必实现完整的观察者契约。
pub trait PreInit: Send + Sync {
    /// 在容器配置本组件之前调用
    fn pre_init(&self) -> Result<(), HookError>;
}

/// ready 阶段初始化钩子
pub trait PostInit: Send + Sync {
    /// 在容器完成本组件配置之后调用
    fn post_init(&self) -> Result<(), HookError>;
}

/// 销毁钩子
pub trait PreDestroy: Send + Sync {
    /// 在组件销毁时调用；销毁永远是尽力而为，因此不返回错误
    fn pre_destroy(&self);
}
