//! 自动装配处理器
//!
//! 在 prepare 阶段读取组件声明的注入点并逐一解析：
//! by-type 要求恰好一个匹配；by-type-collection 物化为注册表顺序的
//! 有序序列，零匹配装配空序列而不是报错。被匹配的记录在赋值前
//! 先经配置器走完自己的生命周期——依赖环正是在这条递归路径上
//! 被发现的。

use crate::context::MutableContext;
use chassis_abstractions::{
    Autowired, CapabilityBinding, ComponentConfigurer, ComponentLookup, ComponentRecord, Context,
    ContextAware, InjectionDirective, InjectionPoint, LifecycleObserver, LookupExt, Registration,
};
use chassis_common::{ContextError, ContextResult, DependencyError};
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// 自动装配处理器
///
/// 自身无法靠自动装配获得依赖，因此以上下文感知组件的身份注册：
/// 收到容器句柄时立即解析出容器中唯一的配置器与查找器。
/// 查找经由 [`ComponentLookup`] 契约进行，对分叉容器的父级委托
/// 完全无感。
pub struct AutowiringProcessor {
    configurer: OnceCell<Arc<dyn ComponentConfigurer>>,
    lookup: OnceCell<Arc<dyn ComponentLookup>>,
}

impl AutowiringProcessor {
    /// 创建新的处理器
    pub fn new() -> Self {
        Self {
            configurer: OnceCell::new(),
            lookup: OnceCell::new(),
        }
    }

    /// 带全部能力绑定的注册定义
    pub fn registration(self) -> Registration<Self> {
        Registration::new(self)
            .with_context_aware()
            .with_lifecycle_observer()
    }

    fn configurer(&self) -> ContextResult<&Arc<dyn ComponentConfigurer>> {
        self.configurer
            .get()
            .ok_or_else(|| ContextError::setup_error("自动装配处理器尚未获得容器句柄"))
    }

    fn lookup(&self) -> ContextResult<&Arc<dyn ComponentLookup>> {
        self.lookup
            .get()
            .ok_or_else(|| ContextError::setup_error("自动装配处理器尚未获得容器句柄"))
    }

    fn autowire_instance(&self, record: &Arc<ComponentRecord>) -> ContextResult<()> {
        let Some(autowired) = record.capability::<dyn Autowired>() else {
            return Ok(());
        };

        for point in autowired.injection_points() {
            self.wire_point(record, &point).map_err(|error| {
                error.wrap_field(record.type_info().name.clone(), point.field())
            })?;
        }
        Ok(())
    }

    fn wire_point(
        &self,
        record: &Arc<ComponentRecord>,
        point: &InjectionPoint<'_>,
    ) -> ContextResult<()> {
        debug!(
            component = %record.type_info(),
            field = point.field(),
            query = %point.query(),
            directive = ?point.directive(),
            "装配字段"
        );

        let candidates = self.lookup()?.find_by_type_id(point.query().id);

        match point.directive() {
            InjectionDirective::ByType => {
                if candidates.is_empty() {
                    return Err(DependencyError::ComponentNotFound {
                        type_name: point.query().name.clone(),
                    }
                    .into());
                }
                if candidates.len() > 1 {
                    return Err(DependencyError::AmbiguousComponent {
                        type_name: point.query().name.clone(),
                        count: candidates.len(),
                    }
                    .into());
                }

                let binding = self.configured_binding(&candidates[0], point)?;
                point.assign(record.type_info(), &[binding])?;
            }
            InjectionDirective::ByTypeCollection => {
                let mut bindings = Vec::with_capacity(candidates.len());
                for candidate in &candidates {
                    bindings.push(self.configured_binding(candidate, point)?);
                }
                point.assign(record.type_info(), &bindings)?;
            }
        }
        Ok(())
    }

    /// 保证候选组件已完成解析，再取回其能力绑定
    fn configured_binding(
        &self,
        candidate: &Arc<ComponentRecord>,
        point: &InjectionPoint<'_>,
    ) -> ContextResult<CapabilityBinding> {
        self.configurer()?.configure_component(candidate)?;

        candidate
            .capability_binding(point.query().id)
            .cloned()
            .ok_or_else(|| {
                DependencyError::MissingCapability {
                    type_name: candidate.type_info().name.clone(),
                    capability: point.query().name.clone(),
                }
                .into()
            })
    }
}

impl Default for AutowiringProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AutowiringProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutowiringProcessor")
            .field("attached", &self.lookup.get().is_some())
            .finish()
    }
}

impl ContextAware for AutowiringProcessor {
    fn set_context(&self, ctx: Arc<dyn Context>) -> ContextResult<()> {
        let concrete = ctx
            .as_any()
            .downcast::<MutableContext>()
            .map_err(|_| ContextError::UnsupportedContextType {
                expected: "MutableContext".to_string(),
            })?;

        let configurer = concrete
            .resolve::<dyn ComponentConfigurer>()
            .map_err(|error| {
                ContextError::setup_error(format!(
                    "需要恰好 1 个组件配置器实例: {error}"
                ))
            })?;
        let lookup = concrete.resolve::<dyn ComponentLookup>().map_err(|error| {
            ContextError::setup_error(format!("需要恰好 1 个组件查找器实例: {error}"))
        })?;

        self.configurer
            .set(configurer)
            .map_err(|_| ContextError::setup_error("容器句柄重复设置"))?;
        self.lookup
            .set(lookup)
            .map_err(|_| ContextError::setup_error("容器句柄重复设置"))?;
        Ok(())
    }
}

impl LifecycleObserver for AutowiringProcessor {
    fn on_prepare(&self, record: &Arc<ComponentRecord>) -> ContextResult<()> {
        self.autowire_instance(record)
    }
}
