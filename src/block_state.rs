use crate::error::EditError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Legacy numeric block ids understood by the block parser.
const BLOCK_NAMES: &[(&str, u16)] = &[
    ("air", 0),
    ("stone", 1),
    ("grass", 2),
    ("dirt", 3),
    ("cobblestone", 4),
    ("planks", 5),
    ("sapling", 6),
    ("bedrock", 7),
    ("water", 9),
    ("lava", 11),
    ("sand", 12),
    ("gravel", 13),
    ("gold_ore", 14),
    ("iron_ore", 15),
    ("coal_ore", 16),
    ("log", 17),
    ("leaves", 18),
    ("sponge", 19),
    ("glass", 20),
    ("sandstone", 24),
    ("wool", 35),
    ("gold_block", 41),
    ("iron_block", 42),
    ("brick_block", 45),
    ("tnt", 46),
    ("bookshelf", 47),
    ("mossy_cobblestone", 48),
    ("obsidian", 49),
    ("diamond_block", 57),
    ("snow_layer", 78),
    ("ice", 79),
    ("snow", 80),
    ("clay", 82),
    ("netherrack", 87),
    ("glowstone", 89),
    ("stonebrick", 98),
    ("quartz_block", 155),
];

/// Block type id plus auxiliary data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BlockState {
    pub id: u16,
    pub data: u8,
}

impl fmt::Display for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get_name() {
            Some(name) => write!(f, "{}", name)?,
            None => write!(f, "{}", self.id)?,
        }
        if self.data != 0 {
            write!(f, ":{}", self.data)?;
        }
        Ok(())
    }
}

impl BlockState {
    pub const AIR: BlockState = BlockState { id: 0, data: 0 };

    pub const fn new(id: u16) -> Self {
        BlockState { id, data: 0 }
    }

    pub const fn with_data(mut self, data: u8) -> Self {
        self.data = data;
        self
    }

    pub fn is_air(&self) -> bool {
        self.id == 0
    }

    pub fn get_name(&self) -> Option<&'static str> {
        BLOCK_NAMES
            .iter()
            .find(|(_, id)| *id == self.id)
            .map(|(name, _)| *name)
    }
}

impl FromStr for BlockState {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, data) = parse_specifier(s)?;
        Ok(BlockState::new(id).with_data(data.unwrap_or(0)))
    }
}

/// Matches blocks by id and, when given, auxiliary data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPattern {
    pub id: u16,
    pub data: Option<u8>,
}

impl BlockPattern {
    pub fn exact(state: BlockState) -> Self {
        BlockPattern {
            id: state.id,
            data: Some(state.data),
        }
    }

    pub fn any_data(id: u16) -> Self {
        BlockPattern { id, data: None }
    }

    /// Concrete state to hand to a world's equality check, if the pattern
    /// pins the auxiliary data.
    pub fn as_state(&self) -> Option<BlockState> {
        self.data.map(|data| BlockState::new(self.id).with_data(data))
    }
}

impl From<BlockState> for BlockPattern {
    fn from(state: BlockState) -> Self {
        BlockPattern::exact(state)
    }
}

impl FromStr for BlockPattern {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, data) = parse_specifier(s)?;
        Ok(BlockPattern { id, data })
    }
}

impl fmt::Display for BlockPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", BlockState::new(self.id))?;
        if let Some(data) = self.data {
            write!(f, ":{}", data)?;
        }
        Ok(())
    }
}

/// Parses `name`, `name:data`, `id` or `id:data`, with an optional
/// `minecraft:` prefix.
fn parse_specifier(input: &str) -> Result<(u16, Option<u8>), EditError> {
    let trimmed = input.trim();
    let spec = trimmed
        .strip_prefix("minecraft:")
        .unwrap_or(trimmed)
        .to_ascii_lowercase();
    if spec.is_empty() {
        return Err(EditError::invalid("empty block specifier"));
    }

    let (name, data) = match spec.split_once(':') {
        Some((name, data)) => {
            let data = data
                .parse::<u8>()
                .map_err(|_| EditError::invalid(format!("invalid block data in '{}'", input)))?;
            (name, Some(data))
        }
        None => (spec.as_str(), None),
    };

    let id = match name.parse::<u16>() {
        Ok(id) => id,
        Err(_) => BLOCK_NAMES
            .iter()
            .find(|(known, _)| *known == name)
            .map(|(_, id)| *id)
            .ok_or_else(|| EditError::invalid(format!("unknown block '{}'", input)))?,
    };

    Ok((id, data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_by_name_and_id() {
        assert_eq!("stone".parse::<BlockState>().unwrap(), BlockState::new(1));
        assert_eq!(
            "minecraft:wool:14".parse::<BlockState>().unwrap(),
            BlockState::new(35).with_data(14)
        );
        assert_eq!("98:2".parse::<BlockState>().unwrap(), BlockState::new(98).with_data(2));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            "unobtainium".parse::<BlockState>(),
            Err(EditError::InvalidArgument(_))
        ));
        assert!("stone:300".parse::<BlockState>().is_err());
        assert!("".parse::<BlockState>().is_err());
    }

    #[test]
    fn test_pattern_without_data_matches_any() {
        let pattern: BlockPattern = "wool".parse().unwrap();
        assert_eq!(pattern, BlockPattern::any_data(35));
        assert_eq!(pattern.as_state(), None);
        let exact: BlockPattern = "wool:3".parse().unwrap();
        assert_eq!(exact.as_state(), Some(BlockState::new(35).with_data(3)));
    }

    #[test]
    fn test_display() {
        assert_eq!(BlockState::new(35).with_data(14).to_string(), "wool:14");
        assert_eq!(BlockState::new(1).to_string(), "stone");
        assert_eq!(BlockState::new(3000).to_string(), "3000");
    }
}
