//! Governance update of the risk parameters.

use veil_storage::{
    self as storage, risk_config_key, treasury_config_key, RiskConfig, StateError, StateMut,
};
use veil_types::consts::SET_RISK_PARAMS_ID;
use veil_types::{Address, Decoder, Encoder};

use crate::actions::{body_decoder, Action};
use crate::context::ExecContext;
use crate::error::ActionError;
use crate::keyset::{KeySet, Permission};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetRiskParams {
    pub backing_floor_bips: u32,

    pub veil_ltv_bips: u16,
    pub wveil_ltv_bips: u16,
    pub wsveil_ltv_bips: u16,

    pub veil_haircut_bips: u16,
    pub wveil_haircut_bips: u16,
    pub wsveil_haircut_bips: u16,
}

impl SetRiskParams {
    fn as_config(&self) -> RiskConfig {
        RiskConfig {
            backing_floor_bips: self.backing_floor_bips,
            veil_ltv_bips: self.veil_ltv_bips,
            wveil_ltv_bips: self.wveil_ltv_bips,
            wsveil_ltv_bips: self.wsveil_ltv_bips,
            veil_haircut_bips: self.veil_haircut_bips,
            wveil_haircut_bips: self.wveil_haircut_bips,
            wsveil_haircut_bips: self.wsveil_haircut_bips,
        }
    }
}

impl Action for SetRiskParams {
    const TYPE_ID: u8 = SET_RISK_PARAMS_ID;

    fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(1 + 4 + 12);
        enc.put_u8(Self::TYPE_ID);
        enc.put_u32(self.backing_floor_bips);
        enc.put_u16(self.veil_ltv_bips);
        enc.put_u16(self.wveil_ltv_bips);
        enc.put_u16(self.wsveil_ltv_bips);
        enc.put_u16(self.veil_haircut_bips);
        enc.put_u16(self.wveil_haircut_bips);
        enc.put_u16(self.wsveil_haircut_bips);
        enc.into_bytes()
    }

    fn decode(bytes: &[u8]) -> Result<Self, ActionError> {
        let mut dec = body_decoder(bytes, Self::TYPE_ID)?;
        let backing_floor_bips = dec.get_u32()?;
        let veil_ltv_bips = dec.get_u16()?;
        let wveil_ltv_bips = dec.get_u16()?;
        let wsveil_ltv_bips = dec.get_u16()?;
        let veil_haircut_bips = dec.get_u16()?;
        let wveil_haircut_bips = dec.get_u16()?;
        let wsveil_haircut_bips = dec.get_u16()?;
        dec.finish()?;
        Ok(Self {
            backing_floor_bips,
            veil_ltv_bips,
            wveil_ltv_bips,
            wsveil_ltv_bips,
            veil_haircut_bips,
            wveil_haircut_bips,
            wsveil_haircut_bips,
        })
    }

    fn state_keys(&self, _actor: &Address) -> KeySet {
        KeySet::new()
            .with(treasury_config_key(), Permission::Read)
            .with(risk_config_key(), Permission::ReadWrite)
    }

    fn execute(
        &self,
        store: &mut dyn StateMut,
        ctx: &ExecContext,
    ) -> Result<Vec<u8>, ActionError> {
        let treasury_cfg = storage::get_treasury_config(store)?;
        if ctx.actor != treasury_cfg.governance {
            return Err(StateError::Unauthorized.into());
        }

        let cfg = self.as_config();
        storage::put_risk_config(store, &cfg)?;

        Ok(SetRiskParamsResult { config: cfg }.encode())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetRiskParamsResult {
    pub config: RiskConfig,
}

impl SetRiskParamsResult {
    pub fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(1 + 4 + 12);
        enc.put_u8(SET_RISK_PARAMS_ID);
        enc.put_u32(self.config.backing_floor_bips);
        enc.put_u16(self.config.veil_ltv_bips);
        enc.put_u16(self.config.wveil_ltv_bips);
        enc.put_u16(self.config.wsveil_ltv_bips);
        enc.put_u16(self.config.veil_haircut_bips);
        enc.put_u16(self.config.wveil_haircut_bips);
        enc.put_u16(self.config.wsveil_haircut_bips);
        enc.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ActionError> {
        let mut dec = Decoder::new(bytes);
        dec.expect_type_id(SET_RISK_PARAMS_ID)?;
        let config = RiskConfig {
            backing_floor_bips: dec.get_u32()?,
            veil_ltv_bips: dec.get_u16()?,
            wveil_ltv_bips: dec.get_u16()?,
            wsveil_ltv_bips: dec.get_u16()?,
            veil_haircut_bips: dec.get_u16()?,
            wveil_haircut_bips: dec.get_u16()?,
            wsveil_haircut_bips: dec.get_u16()?,
        };
        dec.finish()?;
        Ok(Self { config })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_storage::{put_treasury_config, MemStore, TreasuryConfig};
    use veil_types::{TxId, ADDRESS_LEN, ID_LEN};

    fn governance() -> Address {
        Address([7; ADDRESS_LEN])
    }

    fn seed(store: &mut MemStore) {
        put_treasury_config(
            store,
            &TreasuryConfig {
                governance: governance(),
                operations: Address([8; ADDRESS_LEN]),
                max_release_bips: 15,
                release_epoch_seconds: 86_400,
            },
        )
        .unwrap();
    }

    fn action() -> SetRiskParams {
        SetRiskParams {
            backing_floor_bips: 12_000,
            veil_ltv_bips: 3_000,
            wveil_ltv_bips: 3_500,
            wsveil_ltv_bips: 0,
            veil_haircut_bips: 6_000,
            wveil_haircut_bips: 5_500,
            wsveil_haircut_bips: 10_000,
        }
    }

    #[test]
    fn wire_round_trip() {
        let a = action();
        assert_eq!(SetRiskParams::decode(&a.encode()).unwrap(), a);
    }

    #[test]
    fn replaces_risk_config() {
        let mut store = MemStore::new();
        seed(&mut store);
        let ctx = ExecContext::new(1_000, governance(), TxId([0; ID_LEN]));

        action().execute(&mut store, &ctx).unwrap();
        let cfg = storage::get_risk_config(&store).unwrap();
        assert_eq!(cfg.backing_floor_bips, 12_000);
    }

    #[test]
    fn wsveil_ltv_must_stay_zero() {
        let mut store = MemStore::new();
        seed(&mut store);
        let ctx = ExecContext::new(1_000, governance(), TxId([0; ID_LEN]));

        let mut a = action();
        a.wsveil_ltv_bips = 100;
        assert_eq!(
            a.execute(&mut store, &ctx),
            Err(ActionError::State(StateError::InvalidRiskConfig))
        );
    }

    #[test]
    fn governance_only() {
        let mut store = MemStore::new();
        seed(&mut store);
        let ctx = ExecContext::new(1_000, Address([9; ADDRESS_LEN]), TxId([0; ID_LEN]));
        assert_eq!(
            action().execute(&mut store, &ctx),
            Err(ActionError::State(StateError::Unauthorized))
        );
    }
}
