//! 类型转换注册表
//!
//! 转换服务持有一组转换器：内置的标准转换器先被查询，随后是
//! 从容器收集来的转换器组件（集合注入，按注册表顺序）。
//! 匹配按源/目标类型的精确 `TypeId` 进行，首个命中者执行转换。

use chassis_abstractions::{Autowired, InjectedAll, InjectionPoint, Registration};
use chassis_common::{ConversionError, ConversionResult, TypeInfo};
use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

/// 转换器契约
pub trait Converter: Send + Sync {
    /// 源类型
    fn source_type(&self) -> TypeInfo;

    /// 目标类型
    fn target_type(&self) -> TypeInfo;

    /// 执行转换；`value` 的具体类型必须与源类型一致
    fn convert(
        &self,
        value: &(dyn Any + Send + Sync),
    ) -> ConversionResult<Box<dyn Any + Send + Sync>>;
}

/// 转换服务契约
pub trait ConversionService: Send + Sync {
    /// 类型擦除的转换入口
    fn convert_erased(
        &self,
        value: &(dyn Any + Send + Sync),
        source: &TypeInfo,
        target: &TypeInfo,
    ) -> ConversionResult<Box<dyn Any + Send + Sync>>;
}

/// 转换服务泛型便捷方法
pub trait ConversionServiceExt: ConversionService {
    /// 把值转换到目标类型
    fn convert_to<S, T>(&self, value: &S) -> ConversionResult<T>
    where
        S: Any + Send + Sync,
        T: Any + Send + Sync,
    {
        let source = TypeInfo::of::<S>();
        let target = TypeInfo::of::<T>();
        let converted = self.convert_erased(value, &source, &target)?;
        converted
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| ConversionError::ConversionFailed {
                source_type: source.name,
                target_type: target.name,
                source: "转换器产出的类型与目标类型不符".into(),
            })
    }
}

impl<C: ConversionService + ?Sized> ConversionServiceExt for C {}

/// 通用转换服务
///
/// 标准转换器 + 容器贡献的转换器组件。后者通过集合注入收集，
/// 零个贡献者也能正常工作。
pub struct GenericConversionService {
    standard_converters: Vec<Arc<dyn Converter>>,
    converters: InjectedAll<dyn Converter>,
}

impl GenericConversionService {
    /// 创建带标准转换器的转换服务
    pub fn new() -> Self {
        Self {
            standard_converters: standard_converters(),
            converters: InjectedAll::new(),
        }
    }

    /// 带全部能力绑定的注册定义
    pub fn registration(self) -> Registration<Self> {
        Registration::new(self)
            .with_autowiring()
            .expose::<dyn ConversionService>(|c| c)
    }
}

impl Default for GenericConversionService {
    fn default() -> Self {
        Self::new()
    }
}

impl Autowired for GenericConversionService {
    fn injection_points(&self) -> Vec<InjectionPoint<'_>> {
        vec![self.converters.point("converters")]
    }
}

impl ConversionService for GenericConversionService {
    fn convert_erased(
        &self,
        value: &(dyn Any + Send + Sync),
        source: &TypeInfo,
        target: &TypeInfo,
    ) -> ConversionResult<Box<dyn Any + Send + Sync>> {
        let candidate = self
            .standard_converters
            .iter()
            .chain(self.converters.iter())
            .find(|c| c.source_type().id == source.id && c.target_type().id == target.id);

        match candidate {
            Some(converter) => converter.convert(value),
            None => Err(ConversionError::ConverterNotFound {
                source_type: source.name.clone(),
                target_type: target.name.clone(),
            }),
        }
    }
}

/// 从普通函数桥接出的转换器
pub struct FnConverter<S, T, F> {
    convert: F,
    _types: PhantomData<fn(&S) -> T>,
}

impl<S, T, F> Converter for FnConverter<S, T, F>
where
    S: Any + Send + Sync,
    T: Any + Send + Sync,
    F: Fn(&S) -> Result<T, Box<dyn std::error::Error + Send + Sync>> + Send + Sync + 'static,
{
    fn source_type(&self) -> TypeInfo {
        TypeInfo::of::<S>()
    }

    fn target_type(&self) -> TypeInfo {
        TypeInfo::of::<T>()
    }

    fn convert(
        &self,
        value: &(dyn Any + Send + Sync),
    ) -> ConversionResult<Box<dyn Any + Send + Sync>> {
        let typed = value
            .downcast_ref::<S>()
            .ok_or_else(|| ConversionError::ConversionFailed {
                source_type: TypeInfo::of::<S>().name,
                target_type: TypeInfo::of::<T>().name,
                source: "输入值的类型与源类型不符".into(),
            })?;
        let converted =
            (self.convert)(typed).map_err(|source| ConversionError::ConversionFailed {
                source_type: TypeInfo::of::<S>().name,
                target_type: TypeInfo::of::<T>().name,
                source,
            })?;
        Ok(Box::new(converted))
    }
}

/// 从转换函数构建转换器
pub fn converter_fn<S, T, F>(convert: F) -> FnConverter<S, T, F>
where
    S: Any + Send + Sync,
    T: Any + Send + Sync,
    F: Fn(&S) -> Result<T, Box<dyn std::error::Error + Send + Sync>> + Send + Sync + 'static,
{
    FnConverter {
        convert,
        _types: PhantomData,
    }
}

fn standard_converters() -> Vec<Arc<dyn Converter>> {
    vec![
        Arc::new(converter_fn(|s: &String| {
            s.parse::<i64>().map_err(Into::into)
        })),
        Arc::new(converter_fn(|s: &String| {
            s.parse::<f64>().map_err(Into::into)
        })),
        Arc::new(converter_fn(|s: &String| {
            s.parse::<bool>().map_err(Into::into)
        })),
        Arc::new(converter_fn(|s: &String| {
            serde_json::from_str::<serde_json::Value>(s).map_err(Into::into)
        })),
    ]
}
