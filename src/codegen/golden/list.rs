// Code generated by twigc from "list.twig". DO NOT EDIT.

use crate::runtime::Context;
use crate::runtime;
use std::io::Write;

#[allow(unused_mut, unused_variables)]
pub fn template_list_twig(ctx: &Context) -> std::io::Result<()> {
    let mut out = std::io::stdout().lock();
    // line 1, offset 0 in list.twig
    runtime::iterate(runtime::lookup(ctx, "users"), |key, user, r#loop| {
        // line 1, offset 28 in list.twig
        write!(out, "{}", "[")?;
        // line 1, offset 29 in list.twig
        write!(out, "{}", key)?;
        // line 1, offset 38 in list.twig
        write!(out, "{}", "=")?;
        // line 1, offset 39 in list.twig
        {
            let val_0 = runtime::get_attr(user, "name");
            if let Ok(val_0) = val_0 {
                write!(out, "{}", val_0)?;
            }
        }
        // line 1, offset 54 in list.twig
        write!(out, "{}", "]")?;
        Ok(false)
    })?;
    Ok(())
}
