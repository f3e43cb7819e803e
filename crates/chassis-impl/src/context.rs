//! 默认容器实现
//!
//! [`MutableContext`] 持有一张有序注册表：记录一经追加就不再移除
//! 或重排（分叉产生的是另一张注册表，不是对父表的修改）。
//! 注册与启动/停止被视为单线程引导阶段。

use crate::autowiring::AutowiringProcessor;
use crate::lifecycle::{StandardLifecycle, TwoPhaseInitializer};
use chassis_abstractions::{
    ComponentDefinition, ComponentLookup, ComponentRecord, Context, ContextAware, ContextExt,
    ContextObserver, Registration, RegistrationObserver,
};
use chassis_common::{ContextError, ContextResult};
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{error, info};

/// 默认容器
///
/// 注册表与观察者表由容器独占持有；观察者回调可能重入容器
/// （例如自动装配递归触发配置），因此所有回调都在锁外进行。
pub struct MutableContext {
    self_ref: Weak<MutableContext>,
    components: RwLock<Vec<Arc<ComponentRecord>>>,
    registration_observers: RwLock<Vec<Arc<dyn RegistrationObserver>>>,
}

impl MutableContext {
    /// 创建空白容器
    ///
    /// 空白容器只含一个组件：指向容器自身的可注入句柄
    /// （弱引用，避免容器经由自己的注册表持有自己）。
    pub fn new() -> ContextResult<Arc<Self>> {
        let ctx = Arc::new_cyclic(|weak| Self {
            self_ref: weak.clone(),
            components: RwLock::new(Vec::new()),
            registration_observers: RwLock::new(Vec::new()),
        });

        let handle = ContextHandle {
            ctx: Arc::downgrade(&ctx),
        };
        ctx.install(Registration::new(handle).expose::<dyn Context>(|c| c))?;

        Ok(ctx)
    }

    /// 注册表当前的记录快照，按注册顺序
    pub fn records(&self) -> Vec<Arc<ComponentRecord>> {
        self.components.read().clone()
    }

    /// 记录是否属于本容器的注册表
    pub fn contains(&self, record: &Arc<ComponentRecord>) -> bool {
        self.components.read().iter().any(|r| r.id() == record.id())
    }

    fn upgraded(&self) -> ContextResult<Arc<Self>> {
        self.self_ref.upgrade().ok_or(ContextError::ContextDropped)
    }
}

impl Context for MutableContext {
    fn register(&self, definition: ComponentDefinition) -> ContextResult<()> {
        let record = Arc::new(definition.into_record());
        info!(component = %record.type_info(), tags = %record.tags(), "注册组件");

        self.components.write().push(Arc::clone(&record));

        if let Some(aware) = record.capability::<dyn ContextAware>() {
            aware.set_context(self.upgraded()?)?;
        }

        let observers: Vec<Arc<dyn RegistrationObserver>> =
            self.registration_observers.read().clone();
        for observer in &observers {
            observer.on_component_registered(&record);
        }

        // 观察者在通知之后入列，因此不会收到关于自己的回调
        if let Some(observer) = record.capability::<dyn RegistrationObserver>() {
            self.registration_observers.write().push(observer);
        }

        Ok(())
    }

    fn start(&self) -> ContextResult<()> {
        let records = self.records();
        let mut invoked = 0usize;
        for record in &records {
            if let Some(observer) = record.capability::<dyn ContextObserver>() {
                observer.on_context_start(&records)?;
                invoked += 1;
            }
        }
        info!(processors = invoked, "容器已启动");
        Ok(())
    }

    fn stop(&self) -> ContextResult<()> {
        let records = self.records();
        let mut invoked = 0usize;
        let mut failures = 0usize;
        for record in &records {
            if let Some(observer) = record.capability::<dyn ContextObserver>() {
                if let Err(error) = observer.on_context_stop(&records) {
                    failures += 1;
                    error!(component = %record.type_info(), %error, "停止处理器失败");
                }
                invoked += 1;
            }
        }
        info!(processors = invoked, "容器已停止");

        if failures > 0 {
            return Err(ContextError::ShutdownFailed {
                message: format!("{failures} 个停止处理器失败"),
            });
        }
        Ok(())
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl ComponentLookup for MutableContext {
    fn find_by_type_id(&self, query: TypeId) -> Vec<Arc<ComponentRecord>> {
        self.components
            .read()
            .iter()
            .filter(|record| record.satisfies(query))
            .cloned()
            .collect()
    }
}

impl fmt::Debug for MutableContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutableContext")
            .field("components", &self.components.read().len())
            .field(
                "registration_observers",
                &self.registration_observers.read().len(),
            )
            .finish()
    }
}

/// 容器自身的可注入句柄
///
/// 普通组件按类型注入 `dyn Context` 时拿到的就是它；
/// 所有调用转发给所属容器。
struct ContextHandle {
    ctx: Weak<MutableContext>,
}

impl ContextHandle {
    fn upgraded(&self) -> ContextResult<Arc<MutableContext>> {
        self.ctx.upgrade().ok_or(ContextError::ContextDropped)
    }
}

impl Context for ContextHandle {
    fn register(&self, definition: ComponentDefinition) -> ContextResult<()> {
        self.upgraded()?.register(definition)
    }

    fn start(&self) -> ContextResult<()> {
        self.upgraded()?.start()
    }

    fn stop(&self) -> ContextResult<()> {
        self.upgraded()?.stop()
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// 创建带标准生命周期协调器的容器
pub fn standard_context() -> ContextResult<Arc<MutableContext>> {
    let ctx = MutableContext::new()?;
    ctx.install(StandardLifecycle::new().registration())?;
    Ok(ctx)
}

/// 创建开箱即用的默认容器
///
/// 在标准生命周期之上启用两阶段初始化钩子与自动装配。
/// 协调器必须先于自动装配处理器注册（处理器在收到容器句柄时
/// 即解析它的配置器与查找器）。
pub fn default_context() -> ContextResult<Arc<MutableContext>> {
    let ctx = standard_context()?;
    ctx.install(TwoPhaseInitializer::new().registration())?;
    ctx.install(AutowiringProcessor::new().registration())?;
    Ok(ctx)
}
