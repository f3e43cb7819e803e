//! 声明式"组件结构体"引导
//!
//! 应用把自己的组件写成一个定义结构体（字段是共享实例），
//! 通过 [`ComponentModule`] 把各成员的注册定义枚举出来——
//! 这是原来"遍历定义对象并注册其字段"的无反射替代。
//! 成员按字段声明顺序注册，标签随成员一起声明。

use chassis_abstractions::{ComponentDefinition, Context};
use chassis_common::ContextResult;
use chassis_impl::{default_context, MutableContext};
use std::sync::Arc;
use tracing::info;

/// 声明式组件模块契约
pub trait ComponentModule {
    /// 枚举模块成员的注册定义，按字段声明顺序
    fn component_definitions(&self) -> Vec<ComponentDefinition>;
}

/// 把模块成员依次注册进容器
pub fn populate_from_modules(
    ctx: &Arc<MutableContext>,
    modules: &[&dyn ComponentModule],
) -> ContextResult<()> {
    for module in modules {
        for definition in module.component_definitions() {
            info!(component = %definition.type_info(), "注册模块成员");
            ctx.register(definition)?;
        }
    }
    Ok(())
}

/// 创建默认容器并填充模块成员
pub fn complex_context(
    modules: &[&dyn ComponentModule],
) -> ContextResult<Arc<MutableContext>> {
    let ctx = default_context()?;
    populate_from_modules(&ctx, modules)?;
    Ok(ctx)
}

/// 创建、填充并启动容器
pub fn fast_boot(modules: &[&dyn ComponentModule]) -> ContextResult<Arc<MutableContext>> {
    let ctx = complex_context(modules)?;
    ctx.start()?;
    Ok(ctx)
}
