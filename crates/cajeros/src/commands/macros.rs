//! Macro command handlers.

use cajeros_core::MacroConfig;

use crate::cli::{MacroArgs, MacroCommand};
use crate::error::CliError;
use crate::output;

use super::Context;

fn detail(m: &MacroConfig) -> String {
    [
        format!("CBU 90%:  {}", or_dash(&m.cbu90)),
        format!("CBU 100%: {}", or_dash(&m.cbu100)),
    ]
    .join("\n")
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

pub async fn handle(ctx: &Context<'_>, args: MacroArgs) -> Result<(), CliError> {
    match args.command {
        MacroCommand::Show => {
            let current = ctx.dashboard.get_macro().await?;
            let out = output::render_single(&ctx.global.output, &current, detail, |m| {
                format!("{}\n{}", m.cbu90, m.cbu100)
            });
            output::print_output(&out, ctx.global.quiet);
            Ok(())
        }

        MacroCommand::Set { cbu90, cbu100 } => {
            if cbu90.is_none() && cbu100.is_none() {
                return Err(CliError::Validation {
                    field: "macro".into(),
                    reason: "pass --cbu90 and/or --cbu100".into(),
                });
            }
            ctx.dashboard
                .set_macro(cbu90.as_deref(), cbu100.as_deref())
                .await?;
            output::print_notice("✓ Macro updated", ctx.global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_values_render_as_dash() {
        let m = MacroConfig {
            cbu90: "0000003100010000000001".into(),
            cbu100: String::new(),
        };
        let text = detail(&m);
        assert!(text.contains("CBU 90%:  0000003100010000000001"));
        assert!(text.contains("CBU 100%: -"));
    }
}
