use crate::traits::{Kernel, KernelIntrospect};

/// A kernel the pipeline can both mutate and query.
///
/// Stages hold one `&mut dyn KernelBundle` and borrow the read-only view
/// through [`KernelBundle::as_introspect`] between mutations.
pub trait KernelBundle: Kernel + KernelIntrospect {
    fn as_introspect(&self) -> &dyn KernelIntrospect;
}

impl<T: Kernel + KernelIntrospect> KernelBundle for T {
    fn as_introspect(&self) -> &dyn KernelIntrospect {
        self
    }
}
