//! Standard command handlers
//!
//! Every handler writes its own reply lines and returns `true` when the
//! dispatcher should acknowledge with `OK`. Output errors are ignored:
//! a full buffer only truncates the reply.

use trimpot_protocol::{Diagnostic, Reply};

use super::Context;
use crate::param::ParamKind;
use crate::registry::ParamError;

/// Echo `# name:.. value:.. init:.. min:.. max:..` for one parameter
///
/// `init` is what `INIT` would load right now.
pub fn print_definition(ctx: &mut Context<'_, '_>, index: usize) -> bool {
    let registry = ctx.registry;
    let Ok(param) = registry.param(index) else {
        return false;
    };
    let init = registry
        .init_external(index, &mut *ctx.store)
        .unwrap_or_else(|_| param.to_external(param.init));
    let reply = Reply::Definition {
        name: param.name,
        value: param.to_external(param.read()),
        init,
        min: param.min,
        max: param.max,
    };
    let _ = reply.write_to(&mut *ctx.out);
    true
}

/// Echo the definition of every descriptor, in declaration order
pub fn print_all_definitions(ctx: &mut Context<'_, '_>) -> bool {
    for index in 0..ctx.registry.len() {
        print_definition(ctx, index);
    }
    true
}

/// Help line for one parameter; the range is shown for parameters only
pub fn print_param_help(ctx: &mut Context<'_, '_>, index: usize) -> bool {
    let Ok(param) = ctx.registry.param(index) else {
        return false;
    };
    let range = (param.kind == ParamKind::Parameter).then_some((param.min, param.max));
    let _ = Reply::Help {
        name: param.name,
        help: param.help,
        range,
    }
    .write_to(&mut *ctx.out);
    true
}

/// Commands, then parameters, then variables, each as a closed section
pub fn print_all_help(ctx: &mut Context<'_, '_>) -> bool {
    let registry = ctx.registry;

    let _ = Reply::Heading("Commands").write_to(&mut *ctx.out);
    for command in registry.commands() {
        let _ = Reply::Help {
            name: command.name,
            help: command.help,
            range: None,
        }
        .write_to(&mut *ctx.out);
    }
    let _ = Reply::SectionEnd.write_to(&mut *ctx.out);

    for (title, kind) in [
        ("Parameters", ParamKind::Parameter),
        ("Variables", ParamKind::Variable),
    ] {
        let _ = Reply::Heading(title).write_to(&mut *ctx.out);
        for index in registry.indices_of(kind) {
            print_param_help(ctx, index);
        }
        let _ = Reply::SectionEnd.write_to(&mut *ctx.out);
    }
    true
}

/// Add the parameter to the watch list, or remove it
pub fn toggle_watch(ctx: &mut Context<'_, '_>, index: usize) -> bool {
    ctx.watch.toggle(index).is_ok()
}

/// Set a value in operator units and echo the new definition
///
/// A value outside the bounds is reported and nothing changes.
pub fn set_value(ctx: &mut Context<'_, '_>, index: usize, value: i32) -> bool {
    match ctx.registry.set_external(index, value) {
        Ok(_) => print_definition(ctx, index),
        Err(ParamError::OutOfRange { value, min, max }) => {
            let _ = Reply::Diagnostic(Diagnostic::OutOfRange { value, min, max })
                .write_to(&mut *ctx.out);
            false
        }
        Err(_) => false,
    }
}

/// Reload a parameter from the store, or its init value
pub fn init_value(ctx: &mut Context<'_, '_>, index: usize) -> bool {
    if ctx.registry.apply_init(index, &mut *ctx.store).is_err() {
        return false;
    }
    print_definition(ctx, index)
}

/// Write every persisted parameter, then the sentinel
pub fn save_all(ctx: &mut Context<'_, '_>) -> bool {
    ctx.registry.save_all(&mut *ctx.store).is_ok()
}

/// Step the value by one, wrapping from max to min
pub fn increment_value(ctx: &mut Context<'_, '_>, index: usize) -> bool {
    match ctx.registry.increment(index) {
        Ok(_) => print_definition(ctx, index),
        Err(ParamError::OutOfRange { value, min, max }) => {
            let _ = Reply::Diagnostic(Diagnostic::OutOfRange { value, min, max })
                .write_to(&mut *ctx.out);
            false
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::ParamDescriptor;
    use crate::registry::Registry;
    use crate::watch::WatchList;
    use heapless::String;
    use portable_atomic::{AtomicI16, Ordering};
    use trimpot_hal::RamEeprom;

    #[test]
    fn test_set_value_echoes_definition() {
        let speed = AtomicI16::new(0);
        let params = [ParamDescriptor::parameter("N_MOT_MAX", "Max motor RPM")
            .backed_by(&speed)
            .persisted_at(2)
            .with_init(16_000)
            .with_range(10, 2000)
            .with_fix(4)];
        let registry = Registry::new(&params, &[]).unwrap();
        let mut store = RamEeprom::<4>::new();
        let mut watch = WatchList::new();
        let mut out: String<128> = String::new();
        let mut ctx = Context {
            registry: &registry,
            store: &mut store,
            watch: &mut watch,
            out: &mut out,
        };

        assert!(set_value(&mut ctx, 0, 800));
        assert!(!set_value(&mut ctx, 0, 5));
        assert_eq!(speed.load(Ordering::Relaxed), 12_800);
        assert_eq!(
            out.as_str(),
            "# name:N_MOT_MAX value:800 init:1000 min:10 max:2000\r\n\
             ! Value 5 out of range [min:10 max:2000]\r\n"
        );
    }

    #[test]
    fn test_variable_help_has_no_range() {
        let params = [ParamDescriptor::variable("RATE", "Rate *10").with_init(480)];
        let registry = Registry::new(&params, &[]).unwrap();
        let mut store = RamEeprom::<1>::new();
        let mut watch = WatchList::new();
        let mut out: String<64> = String::new();
        let mut ctx = Context {
            registry: &registry,
            store: &mut store,
            watch: &mut watch,
            out: &mut out,
        };

        assert!(print_param_help(&mut ctx, 0));
        assert!(!print_param_help(&mut ctx, 1));
        assert_eq!(out.as_str(), "? RATE:Rate *10\r\n");
    }

    #[test]
    fn test_toggle_watch() {
        let registry = Registry::new(&[], &[]).unwrap();
        let mut store = RamEeprom::<1>::new();
        let mut watch = WatchList::new();
        let mut out: String<8> = String::new();
        let mut ctx = Context {
            registry: &registry,
            store: &mut store,
            watch: &mut watch,
            out: &mut out,
        };

        assert!(toggle_watch(&mut ctx, 5));
        assert!(toggle_watch(&mut ctx, 6));
        assert!(toggle_watch(&mut ctx, 5));
        assert_eq!(watch.iter().next(), Some(6));
        assert_eq!(watch.len(), 1);
    }
}
