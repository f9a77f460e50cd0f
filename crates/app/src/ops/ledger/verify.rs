use clap::Args;
use common::ledger::LedgerProvider;

use super::LedgerOpError;

/// Walk the chain from genesis and report every violation
#[derive(Args, Debug, Clone)]
pub struct VerifyChain;

#[async_trait::async_trait]
impl crate::op::Op for VerifyChain {
    type Error = LedgerOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let ledger = ctx.state()?.ledger().await?;
        let report = ledger.verify_chain().await?;

        if report.valid {
            return Ok(format!("valid ({} blocks)", report.blocks_checked));
        }

        let violations = report
            .violations
            .iter()
            .map(|v| format!("- {}", v))
            .collect::<Vec<_>>()
            .join("\n");
        Err(LedgerOpError::Invalid(format!(
            "{} violation(s) in {} blocks\n{}",
            report.violations.len(),
            report.blocks_checked,
            violations
        )))
    }
}
