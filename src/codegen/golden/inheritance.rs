// Code generated by twigc from "test.twig". DO NOT EDIT.

use crate::runtime::Context;
use std::io::Write;

#[allow(dead_code, non_snake_case, unused_mut, unused_variables)]
fn block_layout_twig__name(ctx: &Context) -> std::io::Result<()> {
    let mut out = std::io::stdout().lock();
    // line 1, offset 43 in test.twig
    write!(out, "{}", "World")?;
    Ok(())
}

#[allow(unused_mut, unused_variables)]
pub fn template_test_twig(ctx: &Context) -> std::io::Result<()> {
    let mut out = std::io::stdout().lock();
    // line 1, offset 0 in layout.twig
    write!(out, "{}", "Hello, ")?;
    // line 1, offset 7 in layout.twig
    block_layout_twig__name(ctx)?;
    // line 1, offset 37 in layout.twig
    write!(out, "{}", "!")?;
    Ok(())
}
