use crate::error::EngineError;
use rand::Rng;

/// One request a virtual user can issue, with its relative weight in the
/// profile's action mix.
#[derive(Debug, Clone)]
pub struct ActionSpec {
    pub name: String,
    pub method: String,
    pub path: String,
    pub weight: u32,
}

/// Picks one action with probability `weight / total`.
///
/// Draws a uniform integer in `[0, total)` and walks the sequence,
/// consuming each action's weight from the draw. The first action whose
/// weight covers the remaining draw wins, so ties on cumulative
/// boundaries resolve deterministically to the earlier action.
pub fn select<'a, R: Rng>(
    actions: &'a [ActionSpec],
    rng: &mut R,
) -> Result<&'a ActionSpec, EngineError> {
    if actions.is_empty() {
        return Err(EngineError::Configuration("action set is empty".to_string()));
    }
    let total: u64 = actions.iter().map(|a| u64::from(a.weight)).sum();
    if total == 0 {
        return Err(EngineError::Configuration(
            "total action weight is zero".to_string(),
        ));
    }

    let mut draw = rng.gen_range(0..total);
    for action in actions {
        let weight = u64::from(action.weight);
        if draw < weight {
            return Ok(action);
        }
        draw -= weight;
    }

    // draw < total guarantees the loop returned
    Err(EngineError::Configuration(
        "weight accumulation failed".to_string(),
    ))
}
