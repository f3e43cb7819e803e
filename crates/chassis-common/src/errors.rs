//! 错误类型定义

use thiserror::Error;

/// 依赖解析错误类型
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("未找到匹配的组件: {type_name}")]
    ComponentNotFound { type_name: String },

    #[error("组件匹配不唯一: {type_name}, 期望 1 个, 实际 {count} 个")]
    AmbiguousComponent { type_name: String, count: usize },

    #[error("检测到循环依赖, 入口组件: {type_name}")]
    CircularDependency { type_name: String },

    #[error("注入字段不可写: {component}.{field}")]
    FieldNotSettable { component: String, field: String },

    #[error("组件 {type_name} 缺少能力绑定: {capability}")]
    MissingCapability {
        type_name: String,
        capability: String,
    },
}

/// 容器错误类型
#[derive(Error, Debug)]
pub enum ContextError {
    #[error("依赖解析失败: {source}")]
    Dependency {
        #[from]
        source: DependencyError,
    },

    #[error("字段注入失败: {component}.{field}, 原因: {source}")]
    FieldResolutionFailed {
        component: String,
        field: String,
        #[source]
        source: Box<ContextError>,
    },

    #[error("不支持的容器类型, 期望: {expected}")]
    UnsupportedContextType { expected: String },

    #[error("容器装配无效: {message}")]
    SetupError { message: String },

    #[error("容器已被释放")]
    ContextDropped,

    #[error("组件生命周期钩子失败: {component} ({phase}), 原因: {source}")]
    HookFailed {
        component: String,
        phase: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("容器停止失败: {message}")]
    ShutdownFailed { message: String },
}

impl ContextError {
    /// 创建装配错误
    pub fn setup_error(message: impl Into<String>) -> Self {
        Self::SetupError {
            message: message.into(),
        }
    }

    /// 以组件类型和字段名包装一次注入失败，保证深层传递时根因可归属
    pub fn wrap_field(self, component: impl Into<String>, field: impl Into<String>) -> Self {
        Self::FieldResolutionFailed {
            component: component.into(),
            field: field.into(),
            source: Box::new(self),
        }
    }
}

/// 类型转换错误类型
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("未找到转换器: {source_type} -> {target_type}")]
    ConverterNotFound {
        source_type: String,
        target_type: String,
    },

    #[error("类型转换失败: {source_type} -> {target_type}, 原因: {source}")]
    ConversionFailed {
        source_type: String,
        target_type: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// 结果类型别名
pub type DependencyResult<T> = Result<T, DependencyError>;
pub type ContextResult<T> = Result<T, ContextError>;
pub type ConversionResult<T> = Result<T, ConversionError>;
