//! Runtime bundle generation
//!
//! Each chunk becomes one self-executing script: a registry of module
//! loader functions, a per-invocation cache and a synchronous `require`.
//! The entry module's code runs inline at the end and the script evaluates
//! to the entry's `module.exports`.

use std::fmt::Write as _;

use crate::graph::Module;

/// Renders a chunk whose modules are `modules` and whose entry is `entry`.
pub fn render_chunk(entry: &Module, modules: &[&Module]) -> String {
    let mut out = String::new();

    out.push_str("(() => {\n");
    out.push_str("  var __tinypack_modules__ = {\n");
    for module in modules {
        let _ = writeln!(
            out,
            "    {}: (function (module, exports, require) {{\n{}\n    }}),",
            quote(&module.id),
            module.source
        );
    }
    out.push_str("  };\n");
    out.push_str(RUNTIME);
    let _ = writeln!(
        out,
        "  var module = (__tinypack_cache__[{}] = {{ exports: {{}} }});",
        quote(&entry.id)
    );
    out.push_str("  var exports = module.exports;\n");
    out.push_str(&entry.source);
    out.push_str("\n  return module.exports;\n");
    out.push_str("})();\n");

    out
}

const RUNTIME: &str = r#"  var __tinypack_cache__ = {};
  function require(moduleId) {
    var cachedModule = __tinypack_cache__[moduleId];
    if (cachedModule !== undefined) {
      return cachedModule.exports;
    }
    if (!Object.prototype.hasOwnProperty.call(__tinypack_modules__, moduleId)) {
      throw new Error("Cannot find module '" + moduleId + "'");
    }
    var module = (__tinypack_cache__[moduleId] = { exports: {} });
    __tinypack_modules__[moduleId].call(module.exports, module, module.exports, require);
    return module.exports;
  }
"#;

fn quote(id: &str) -> String {
    serde_json::Value::from(id).to_string()
}
