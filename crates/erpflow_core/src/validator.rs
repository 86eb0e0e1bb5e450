//! Transition validators.
//!
//! A validator is consulted before a transition that names it. Returning an
//! error vetoes the transition and leaves the entity's state untouched.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use erpflow_core::{typed_validator, TransitionValidator};
//!
//! struct SalesOrder { credit_ok: bool }
//!
//! let credit_check = typed_validator(|_ctx, order: &SalesOrder| {
//!     if order.credit_ok {
//!         Ok(())
//!     } else {
//!         Err(anyhow::anyhow!("customer is over their credit limit"))
//!     }
//! });
//! machine.register_validator("credit_check", Arc::new(credit_check)).await;
//! ```

use std::any::{type_name, Any};
use std::marker::PhantomData;

use async_trait::async_trait;

use crate::context::TransitionContext;

/// The business entity under transition, opaque to the engine.
pub type Entity = dyn Any + Send + Sync;

/// Trait for transition validators.
///
/// Validators run while the state machine holds its lock for that
/// transition, so they must not call back into the same state machine.
/// Long-running validators should watch `ctx.cancellation_token()`.
#[async_trait]
pub trait TransitionValidator: Send + Sync {
    /// Inspect a transition attempt; an error vetoes it.
    async fn validate(&self, ctx: &TransitionContext, entity: &Entity) -> anyhow::Result<()>;
}

/// Validator backed by a synchronous closure over the untyped entity.
pub struct FnValidator<F> {
    f: F,
}

impl<F> FnValidator<F>
where
    F: Fn(&TransitionContext, &Entity) -> anyhow::Result<()> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> TransitionValidator for FnValidator<F>
where
    F: Fn(&TransitionContext, &Entity) -> anyhow::Result<()> + Send + Sync,
{
    async fn validate(&self, ctx: &TransitionContext, entity: &Entity) -> anyhow::Result<()> {
        (self.f)(ctx, entity)
    }
}

/// Validator over a concrete entity type.
///
/// Any entity of a different type is rejected.
pub struct TypedValidator<T, F> {
    f: F,
    _entity: PhantomData<fn(&T)>,
}

#[async_trait]
impl<T, F> TransitionValidator for TypedValidator<T, F>
where
    T: Any + Send + Sync,
    F: Fn(&TransitionContext, &T) -> anyhow::Result<()> + Send + Sync,
{
    async fn validate(&self, ctx: &TransitionContext, entity: &Entity) -> anyhow::Result<()> {
        match entity.downcast_ref::<T>() {
            Some(typed) => (self.f)(ctx, typed),
            None => anyhow::bail!("expected entity of type {}", type_name::<T>()),
        }
    }
}

/// Wrap a closure over the untyped entity.
pub fn validator_fn<F>(f: F) -> FnValidator<F>
where
    F: Fn(&TransitionContext, &Entity) -> anyhow::Result<()> + Send + Sync,
{
    FnValidator::new(f)
}

/// Wrap a closure over a concrete entity type.
pub fn typed_validator<T, F>(f: F) -> TypedValidator<T, F>
where
    T: Any + Send + Sync,
    F: Fn(&TransitionContext, &T) -> anyhow::Result<()> + Send + Sync,
{
    TypedValidator {
        f,
        _entity: PhantomData,
    }
}
