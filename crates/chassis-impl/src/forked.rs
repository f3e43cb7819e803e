//! 父子容器分叉
//!
//! 分叉产生的子容器拥有全新的注册表和协调器；本地查找命中即返回，
//! 零命中时把同一查询委托给父容器。委托规则对任意层级自然组合：
//! 父容器自己也可能是一个分叉容器。

use crate::autowiring::AutowiringProcessor;
use crate::context::MutableContext;
use crate::lifecycle::{StandardLifecycle, TwoPhaseInitializer};
use chassis_abstractions::{
    ComponentConfigurer, ComponentLookup, ComponentRecord, Context, ContextAware, ContextExt,
    ContextObserver, LookupExt, Registration, RegistrationObserver,
};
use chassis_common::{ContextError, ContextResult};
use std::any::TypeId;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// 分叉生命周期
///
/// 包装一个全新的标准协调器；查找在本地注册表零命中时回退到
/// 父容器，配置则按记录的归属路由——父容器的记录由父容器的
/// 配置器驱动，其生命周期与销毁归属留在父容器。
pub struct ForkedLifecycle {
    inner: StandardLifecycle,
    parent_lookup: Arc<dyn ComponentLookup>,
    parent_configurer: Arc<dyn ComponentConfigurer>,
}

impl ForkedLifecycle {
    /// 以父容器的查找器与配置器创建分叉协调器
    pub fn new(
        parent_lookup: Arc<dyn ComponentLookup>,
        parent_configurer: Arc<dyn ComponentConfigurer>,
    ) -> Self {
        Self {
            inner: StandardLifecycle::new(),
            parent_lookup,
            parent_configurer,
        }
    }

    /// 带全部能力绑定的注册定义
    pub fn registration(self) -> Registration<Self> {
        Registration::new(self)
            .with_context_aware()
            .expose::<dyn RegistrationObserver>(|c| c)
            .expose::<dyn ContextObserver>(|c| c)
            .expose::<dyn ComponentConfigurer>(|c| c)
            .expose::<dyn ComponentLookup>(|c| c)
    }

    /// 子容器自身的获取顺序快照
    pub fn acquisition_order(&self) -> Vec<Arc<ComponentRecord>> {
        self.inner.acquisition_order()
    }
}

impl fmt::Debug for ForkedLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForkedLifecycle")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl ContextAware for ForkedLifecycle {
    fn set_context(&self, ctx: Arc<dyn Context>) -> ContextResult<()> {
        self.inner.set_context(ctx)
    }
}

impl RegistrationObserver for ForkedLifecycle {
    fn on_component_registered(&self, record: &Arc<ComponentRecord>) {
        self.inner.on_component_registered(record);
    }
}

impl ContextObserver for ForkedLifecycle {
    fn on_context_start(&self, records: &[Arc<ComponentRecord>]) -> ContextResult<()> {
        self.inner.on_context_start(records)
    }

    fn on_context_stop(&self, records: &[Arc<ComponentRecord>]) -> ContextResult<()> {
        self.inner.on_context_stop(records)
    }
}

impl ComponentLookup for ForkedLifecycle {
    fn find_by_type_id(&self, query: TypeId) -> Vec<Arc<ComponentRecord>> {
        let local = self.inner.find_by_type_id(query);
        if !local.is_empty() {
            return local;
        }

        debug!(?query, "本地未命中, 回退父容器查询");
        self.parent_lookup.find_by_type_id(query)
    }
}

impl ComponentConfigurer for ForkedLifecycle {
    fn configure_component(&self, record: &Arc<ComponentRecord>) -> ContextResult<()> {
        if self.inner.owns(record)? {
            self.inner.configure_component(record)
        } else {
            self.parent_configurer.configure_component(record)
        }
    }
}

/// 从已装配的父容器分叉出子容器
///
/// 父容器必须恰好各有一个组件查找器与组件配置器（标准容器
/// 构造链保证这一点）。子容器自带两阶段初始化与自动装配。
pub fn fork_context(parent: &Arc<MutableContext>) -> ContextResult<Arc<MutableContext>> {
    let parent_lookup = parent.resolve::<dyn ComponentLookup>().map_err(|error| {
        ContextError::setup_error(format!(
            "父容器异常: 需要恰好 1 个组件查找器实例: {error}"
        ))
    })?;
    let parent_configurer = parent
        .resolve::<dyn ComponentConfigurer>()
        .map_err(|error| {
            ContextError::setup_error(format!(
                "父容器异常: 需要恰好 1 个组件配置器实例: {error}"
            ))
        })?;

    let ctx = MutableContext::new()?;
    ctx.install(ForkedLifecycle::new(parent_lookup, parent_configurer).registration())?;
    ctx.install(TwoPhaseInitializer::new().registration())?;
    ctx.install(AutowiringProcessor::new().registration())?;

    Ok(ctx)
}
