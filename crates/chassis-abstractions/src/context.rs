//! 容器公共契约
//!
//! [`Context`] 是组件容器对外的最小接口：注册、启动、停止。
//! 注册与启动被视为单线程的引导阶段，契约本身不承诺并发修改安全。

use crate::component::{ComponentDefinition, ComponentRecord, Registration};
use chassis_common::ContextResult;
use std::any::Any;
use std::sync::Arc;

/// 容器公共契约
pub trait Context: Send + Sync + 'static {
    /// 注册组件
    ///
    /// 若定义暴露了上下文感知能力，注册过程中立即向组件递交容器句柄；
    /// 随后按观察者注册顺序同步通知全部组件注册观察者。
    fn register(&self, definition: ComponentDefinition) -> ContextResult<()>;

    /// 启动容器：驱动所有组件走完 prepare → ready 两个阶段
    ///
    /// 任何一个组件初始化失败都会中止整个启动（快速失败引导）；
    /// 已部分启动的组件不会被自动回滚。
    fn start(&self) -> ContextResult<()>;

    /// 停止容器：按获取顺序的逆序销毁组件
    ///
    /// 销毁是尽力而为的：单个组件的销毁失败被记录但不阻断其余组件。
    fn stop(&self) -> ContextResult<()>;

    /// 供上下文感知组件向具体容器类型向下转型
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// 上下文感知契约
///
/// 无法依赖自动装配的组件（例如自动装配处理器本身）在注册时
/// 通过该契约获得所属容器的句柄。
pub trait ContextAware: Send + Sync {
    /// 接收所属容器的句柄
    ///
    /// 收到非预期具体类型的容器句柄属于编程错误，
    /// 以 [`ContextError::UnsupportedContextType`] 报告且从不恢复。
    ///
    /// [`ContextError::UnsupportedContextType`]: chassis_common::ContextError::UnsupportedContextType
    fn set_context(&self, ctx: Arc<dyn Context>) -> ContextResult<()>;
}

/// 组件注册观察者契约
pub trait RegistrationObserver: Send + Sync {
    /// 每当一条新记录进入注册表时同步回调
    fn on_component_registered(&self, record: &Arc<ComponentRecord>);
}

/// 容器事件观察者契约
///
/// 由需要参与容器启动/停止流程的组件实现（典型实现是生命周期协调器）。
pub trait ContextObserver: Send + Sync {
    /// 容器启动；`records` 为注册表当前的记录快照（注册顺序）
    fn on_context_start(&self, records: &[Arc<ComponentRecord>]) -> ContextResult<()>;

    /// 容器停止
    fn on_context_stop(&self, records: &[Arc<ComponentRecord>]) -> ContextResult<()>;
}

/// 容器泛型便捷方法
pub trait ContextExt: Context {
    /// 注册一个构建完毕的组件注册
    fn install<T: Send + Sync + 'static>(&self, registration: Registration<T>) -> ContextResult<()> {
        self.register(registration.into_definition())
    }

    /// 注册组件实例（空标签）
    fn register_component<T: Send + Sync + 'static>(&self, instance: T) -> ContextResult<()> {
        self.register(Registration::new(instance).into_definition())
    }

    /// 注册组件实例并携带标签
    fn register_with_tags<T: Send + Sync + 'static>(
        &self,
        instance: T,
        tags: &str,
    ) -> ContextResult<()> {
        self.register(
            Registration::new(instance)
                .with_tags(tags)
                .into_definition(),
        )
    }
}

impl<C: Context + ?Sized> ContextExt for C {}
