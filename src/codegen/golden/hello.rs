// Code generated by twigc from "hello.twig". DO NOT EDIT.

use crate::runtime::Context;
use std::io::Write;

#[allow(unused_mut, unused_variables)]
pub fn template_hello_twig(ctx: &Context) -> std::io::Result<()> {
    let mut out = std::io::stdout().lock();
    // line 1, offset 0 in hello.twig
    write!(out, "{}", "Hello, World!")?;
    Ok(())
}
