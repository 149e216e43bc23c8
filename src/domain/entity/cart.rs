use super::{impl_entity, EntityData};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItemState {
    pub user_id: i64,
    pub dish_id: i64,
    pub quantity: i32,
}

#[derive(Debug, Clone)]
pub struct CartItem {
    pub(in crate::domain) data: EntityData,
    pub state: CartItemState,
}

impl_entity!(CartItem, CartItemState);

impl CartItem {
    pub fn user_id(&self) -> i64 {
        self.state.user_id
    }

    pub fn dish_id(&self) -> i64 {
        self.state.dish_id
    }

    pub fn quantity(&self) -> i32 {
        self.state.quantity
    }
}
