use std::path::PathBuf;

use clap::Args;

use super::GroupOpError;
use crate::state::MemberShare;

/// Store a share someone issued to us
#[derive(Args, Debug, Clone)]
pub struct Import {
    /// Share JSON, as written by 'group add' or 'group share'
    pub input: PathBuf,
}

#[async_trait::async_trait]
impl crate::op::Op for Import {
    type Error = GroupOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let bundle: MemberShare = serde_json::from_str(&std::fs::read_to_string(&self.input)?)?;

        if bundle.share.member != state.config.identity {
            return Err(GroupOpError::NotOurShare {
                member: bundle.share.member,
                identity: state.config.identity,
            });
        }

        // unwrapping proves the share is ours and belongs to this group key
        bundle
            .share
            .recover_for(&bundle.group, &state.load_key()?)?;
        let path = state.save_share(&bundle)?;

        Ok(format!(
            "Imported share of group {} (fingerprint {}) to {}",
            bundle.group.id,
            bundle.group.public_key.fingerprint(),
            path.display()
        ))
    }
}
