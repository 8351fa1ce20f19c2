//! Function systems.
//!
//! [`WithSystemParams`] is implemented for every function of up to 16 [`Parameter`]s, which makes
//! plain functions and closures usable as systems through [`IntoSystem`]:
//!
//! ```rust,ignore
//! fn movement(bodies: Query<(Entity, Position, Velocity)>, world: Res<Handle>) { .. }
//!
//! let system = movement.into_system(&registry, Mode::Recurring);
//! ```
//!
//! The parameter list is resolved to [`Input`]s once, at conversion. At run time each argument is
//! turned back into its parameter with [`Parameter::extract`] and the function is called.

use std::any::type_name;

use crate::{
    all_arities,
    ecs::{
        component::Registry,
        system::{Argument, Input, IntoSystem, Mode, System, param::Parameter},
    },
};

/// Trait enabling functions to be called with system parameters.
///
/// You don't implement this trait manually. It's implemented by macros for functions taking zero
/// to sixteen parameters. The `Params` tuple only disambiguates the implementations.
pub trait WithSystemParams<Params>: Send + 'static {
    /// The inputs of the function's parameters, in order.
    fn inputs(registry: &Registry) -> Vec<Input>;

    /// Extract each parameter from its argument and call the function.
    ///
    /// # Panics
    ///
    /// If `args` does not hold exactly one argument per parameter.
    fn run(&mut self, args: &[Argument]);
}

impl<Func> WithSystemParams<()> for Func
where
    Func: FnMut() + Send + 'static,
{
    fn inputs(_registry: &Registry) -> Vec<Input> {
        Vec::new()
    }

    fn run(&mut self, _args: &[Argument]) {
        self();
    }
}

macro_rules! system_param_function {
    ($($param:ident),*) => {
        impl<Func, $($param: Parameter),*> WithSystemParams<($($param,)*)> for Func
        where
            Func: FnMut($($param),*) + Send + 'static,
        {
            fn inputs(registry: &Registry) -> Vec<Input> {
                vec![$($param::input(registry)),*]
            }

            #[allow(non_snake_case)]
            fn run(&mut self, args: &[Argument]) {
                let [$($param),*] = args else {
                    panic!(
                        "System expected {} arguments but got {}. This indicates a bug in the schedule.",
                        [$(stringify!($param)),*].len(),
                        args.len()
                    );
                };
                self($(<$param as Parameter>::extract($param)),*);
            }
        }
    };
}

all_arities!(system_param_function);

impl<Func, Params> IntoSystem<Params> for Func
where
    Func: WithSystemParams<Params>,
{
    fn into_system(mut self, registry: &Registry, mode: Mode) -> System {
        let inputs = Func::inputs(registry);
        System::new(type_name::<Func>(), inputs, mode, move |args| self.run(args))
    }
}
