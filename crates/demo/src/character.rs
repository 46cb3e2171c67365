//! A character model whose parts stream in over a few seconds.
use std::time::Duration;

use treewait::prelude::*;

/// One simulated frame at 60 Hz.
pub const FRAME: Duration = Duration::from_micros(16_667);

/// Parts parented into the character: `(frame, class, name)`.
pub const ARRIVALS: &[(u64, &str, &str)] = &[
    (5, "Part", "HumanoidRootPart"),
    (12, "Part", "Torso"),
    (30, "Part", "Head"),
    (45, "MeshPart", "LeftArm"),
    (52, "MeshPart", "RightArm"),
];

pub const PRIMARY_PART_FRAME: u64 = 20;
pub const TEAM_FRAME: u64 = 70;

/// Parts the character can't do without, in the order we want them back.
pub const BODY: [&str; 3] = ["Head", "Torso", "HumanoidRootPart"];

pub struct Rig {
    pub workspace: SimInstance,
    pub model: SimInstance,
}

impl Rig {
    pub fn new() -> Result<Self, SimError> {
        let workspace = SimInstance::new("Workspace", "Workspace");
        let model = SimInstance::new_in("Model", "Character", &workspace)?;
        Ok(Rig { workspace, model })
    }

    /// Apply whatever is scheduled for `frame`.
    pub fn stream_in(&self, frame: u64) -> Result<(), SimError> {
        for (_, class, name) in ARRIVALS.iter().filter(|arrival| arrival.0 == frame) {
            log::info!("frame {frame}: {name} arrives");
            SimInstance::new_in(*class, *name, &self.model)?;
        }
        if frame == PRIMARY_PART_FRAME {
            if let Some(root) = self.model.find_first_child("HumanoidRootPart", false) {
                log::info!("frame {frame}: primary part set");
                self.model.set_primary_part(Some(&root));
            }
        }
        if frame == TEAM_FRAME {
            log::info!("frame {frame}: team assigned");
            self.model.set_attribute("Team", Some("Red".into()));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct Assembled {
    pub body: Vec<SimInstance>,
    pub primary_part: SimInstance,
    pub arms: usize,
    pub team: Attribute,
}

/// Wait for the character to be fully assembled.
pub async fn assemble<C: Clock>(
    waiter: &Waiter<C>,
    model: &SimInstance,
) -> Result<Assembled, WaitError> {
    let body = waiter.children(model, &BODY, false, None).await?;
    log::info!("body assembled: {body:?}");

    let primary_part = waiter.primary_part(model, None).await?;
    log::info!("primary part: {primary_part:?}");

    // No event says "both arms are in", so poll for it.
    let arms = waiter
        .predicate_on(
            model,
            || {
                let arms = model
                    .children()
                    .iter()
                    .filter(|child| child.name().ends_with("Arm"))
                    .count();
                (arms == 2).then_some(arms)
            },
            None,
        )
        .await?;
    log::info!("both arms attached");

    let team = waiter
        .attribute(model, "Team", Some(Duration::from_secs(5)))
        .await?;
    log::info!("team: {team:?}");

    Ok(Assembled {
        body,
        primary_part,
        arms,
        team,
    })
}
