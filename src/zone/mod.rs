pub mod field;
pub mod insert;
pub mod pile;
pub mod slotted;

pub use field::*;
pub use pile::Pile;
pub use slotted::SlotZone;

use crate::{
    card::{types::CardId, Card},
    enums::ZoneType,
    exception::ZoneError,
};

/// 카드를 담는 영역의 공통 동작.
pub trait Zone {
    fn zone_type(&self) -> ZoneType;

    fn contains(&self, id: CardId) -> bool;

    fn find(&self, id: CardId) -> Option<&Card>;

    fn remove(&mut self, id: CardId) -> Option<Card>;

    /// 같은 id 를 가진 카드를 제자리에서 교체합니다.
    fn replace(&mut self, card: Card) -> Result<(), ZoneError>;

    /// 슬롯 영역은 슬롯 수, 순서형 영역은 카드 수.
    fn len(&self) -> usize;

    fn cards(&self) -> Vec<&Card>;
}
