//! Hoverboard controller values exposed on the console
//!
//! [`BoardState`] is the memory the motor controller and input stages
//! share with the console: one [`MotorSide`] per sub-controller, two
//! input channels and a few measured values. [`parameters`] declares the
//! console table over it.

use portable_atomic::{AtomicI16, AtomicU16, AtomicU8, Ordering};

use crate::param::{ParamDescriptor, WriteHook};

/// Factory defaults, in the controller's own units
pub mod defaults {
    /// Requested control mode (1 voltage, 2 speed, 3 torque)
    pub const CTRL_MOD_REQ: u8 = 1;
    /// Commutation type (0 commutation, 1 sinusoidal, 2 FOC)
    pub const CTRL_TYP_SEL: u8 = 2;
    /// Phase current limit, A
    pub const I_MOT_MAX: i32 = 15;
    /// Speed limit, RPM
    pub const N_MOT_MAX: i32 = 1000;
    pub const FIELD_WEAK_ENA: u8 = 0;
    /// Input level where field weakening is fully on
    pub const FIELD_WEAK_HI: i32 = 1000;
    /// Input level where field weakening starts
    pub const FIELD_WEAK_LO: i32 = 750;
    /// Field weakening current, A
    pub const FIELD_WEAK_MAX: i32 = 5;
    /// Phase advance, degrees
    pub const PHASE_ADV_MAX: i32 = 25;
    /// Command ramp rate, 12.4 fixed point
    pub const RATE: i32 = 480;
    /// 2.14 fixed point
    pub const SPEED_COEFFICIENT: i32 = 16384;
    /// 2.14 fixed point
    pub const STEER_COEFFICIENT: i32 = 8192;
    /// ADC counts per ampere
    pub const A2BIT_CONV: i32 = 50;
}

/// Nominal input command limit without field weakening
pub const INPUT_LIMIT: i16 = 1000;

/// Model parameters of one sub-controller
#[derive(Debug, Default)]
pub struct MotorSide {
    pub ctrl_typ: AtomicU8,
    /// Phase current limit, 12.4 fixed point ADC counts
    pub i_max: AtomicI16,
    /// Speed limit, 12.4 fixed point RPM
    pub n_max: AtomicI16,
    pub field_weak_ena: AtomicU8,
    pub field_weak_hi: AtomicI16,
    pub field_weak_lo: AtomicI16,
    pub id_field_weak_max: AtomicI16,
    pub pha_adv_max: AtomicI16,
    /// Measured DC link current, ADC counts
    pub i_dc_link: AtomicI16,
    /// Measured speed, RPM
    pub n_mot: AtomicI16,
}

impl MotorSide {
    pub const fn new() -> Self {
        Self {
            ctrl_typ: AtomicU8::new(0),
            i_max: AtomicI16::new(0),
            n_max: AtomicI16::new(0),
            field_weak_ena: AtomicU8::new(0),
            field_weak_hi: AtomicI16::new(0),
            field_weak_lo: AtomicI16::new(0),
            id_field_weak_max: AtomicI16::new(0),
            pha_adv_max: AtomicI16::new(0),
            i_dc_link: AtomicI16::new(0),
            n_mot: AtomicI16::new(0),
        }
    }
}

/// One analog/digital input channel
#[derive(Debug, Default)]
pub struct InputChannel {
    pub typ: AtomicU8,
    pub min: AtomicI16,
    pub mid: AtomicI16,
    pub max: AtomicI16,
    pub raw: AtomicI16,
    pub cmd: AtomicI16,
}

impl InputChannel {
    pub const fn new() -> Self {
        Self {
            typ: AtomicU8::new(0),
            min: AtomicI16::new(0),
            mid: AtomicI16::new(0),
            max: AtomicI16::new(0),
            raw: AtomicI16::new(0),
            cmd: AtomicI16::new(0),
        }
    }
}

/// Controller memory shared with the console
#[derive(Debug, Default)]
pub struct BoardState {
    pub ctrl_mod_req: AtomicU8,
    pub left: MotorSide,
    pub right: MotorSide,
    pub input1: InputChannel,
    pub input2: InputChannel,
    /// Average measured speed, RPM
    pub speed_avg: AtomicI16,
    /// Battery voltage ADC reading
    pub batt1: AtomicU16,
    /// Largest accepted input command
    pub input_max: AtomicI16,
    /// Smallest accepted input command
    pub input_min: AtomicI16,
}

impl BoardState {
    /// All-zero state; `parameters` plus a boot load fill it in
    pub const fn new() -> Self {
        Self {
            ctrl_mod_req: AtomicU8::new(0),
            left: MotorSide::new(),
            right: MotorSide::new(),
            input1: InputChannel::new(),
            input2: InputChannel::new(),
            speed_avg: AtomicI16::new(0),
            batt1: AtomicU16::new(0),
            input_max: AtomicI16::new(0),
            input_min: AtomicI16::new(0),
        }
    }

    /// Recompute the input command limits
    ///
    /// With field weakening enabled the command may reach the field
    /// weakening high threshold instead of the nominal limit.
    pub fn refresh_input_limits(&self) {
        let mut limit = INPUT_LIMIT;
        if self.left.field_weak_ena.load(Ordering::Relaxed) != 0 {
            let hi = self.left.field_weak_hi.load(Ordering::Relaxed) >> 4;
            limit = limit.max(hi);
        }
        self.input_max.store(limit, Ordering::Relaxed);
        self.input_min.store(-limit, Ordering::Relaxed);
    }
}

impl WriteHook for BoardState {
    fn after_write(&self) {
        self.refresh_input_limits();
    }
}

/// Number of entries in the board table
pub const PARAM_COUNT: usize = 31;

/// Console table over `state`
///
/// Init values are internal: `(amps * A2BIT_CONV) << 4` for currents,
/// `value << 4` for the other fixed-point entries.
pub fn parameters(state: &BoardState) -> [ParamDescriptor<'_>; PARAM_COUNT] {
    use defaults::*;

    let (left, right) = (&state.left, &state.right);
    let (in1, in2) = (&state.input1, &state.input2);

    [
        // Control
        ParamDescriptor::parameter("CTRL_MOD", "Ctrl mode 1:VLT 2:SPD 3:TRQ")
            .backed_by(&state.ctrl_mod_req)
            .with_init(CTRL_MOD_REQ as i32)
            .with_range(1, 3),
        ParamDescriptor::parameter("CTRL_TYP", "Ctrl type 0:COM 1:SIN 2:FOC")
            .backed_by(&left.ctrl_typ)
            .mirrored_by(&right.ctrl_typ)
            .with_init(CTRL_TYP_SEL as i32)
            .with_range(0, 2),
        ParamDescriptor::parameter("I_MOT_MAX", "Max phase current A")
            .backed_by(&left.i_max)
            .mirrored_by(&right.i_max)
            .persisted_at(1)
            .with_init((I_MOT_MAX * A2BIT_CONV) << 4)
            .with_range(1, 40)
            .with_div(A2BIT_CONV)
            .with_fix(4),
        ParamDescriptor::parameter("N_MOT_MAX", "Max motor RPM")
            .backed_by(&left.n_max)
            .mirrored_by(&right.n_max)
            .persisted_at(2)
            .with_init(N_MOT_MAX << 4)
            .with_range(10, 2000)
            .with_fix(4),
        ParamDescriptor::parameter("FI_WEAK_ENA", "Enable field weak")
            .backed_by(&left.field_weak_ena)
            .mirrored_by(&right.field_weak_ena)
            .with_init(FIELD_WEAK_ENA as i32)
            .with_range(0, 1)
            .on_write(state),
        ParamDescriptor::parameter("FI_WEAK_HI", "Field weak high RPM")
            .backed_by(&left.field_weak_hi)
            .mirrored_by(&right.field_weak_hi)
            .with_init(FIELD_WEAK_HI << 4)
            .with_range(0, 1500)
            .with_fix(4)
            .on_write(state),
        ParamDescriptor::parameter("FI_WEAK_LO", "Field weak low RPM")
            .backed_by(&left.field_weak_lo)
            .mirrored_by(&right.field_weak_lo)
            .with_init(FIELD_WEAK_LO << 4)
            .with_range(0, 1000)
            .with_fix(4)
            .on_write(state),
        ParamDescriptor::parameter("FI_WEAK_MAX", "Field weak max current A(FOC)")
            .backed_by(&left.id_field_weak_max)
            .mirrored_by(&right.id_field_weak_max)
            .with_init((FIELD_WEAK_MAX * A2BIT_CONV) << 4)
            .with_range(0, 20)
            .with_div(A2BIT_CONV)
            .with_fix(4),
        ParamDescriptor::parameter("PHA_ADV_MAX", "Max Phase Adv angle Deg(SIN)")
            .backed_by(&left.pha_adv_max)
            .mirrored_by(&right.pha_adv_max)
            .with_init(PHASE_ADV_MAX << 4)
            .with_range(0, 55)
            .with_fix(4),
        // Inputs
        ParamDescriptor::parameter("PRI_IN1_TYP", "Input1 type")
            .backed_by(&in1.typ)
            .persisted_at(3)
            .with_range(0, 3),
        ParamDescriptor::parameter("PRI_IN1_MIN", "Input1 min")
            .backed_by(&in1.min)
            .persisted_at(4)
            .with_range(0, 4095),
        ParamDescriptor::parameter("PRI_IN1_MID", "Input1 mid")
            .backed_by(&in1.mid)
            .persisted_at(5)
            .with_range(0, 4095),
        ParamDescriptor::parameter("PRI_IN1_MAX", "Input1 max")
            .backed_by(&in1.max)
            .persisted_at(6)
            .with_range(0, 4095),
        ParamDescriptor::parameter("PRI_IN2_TYP", "Input2 type")
            .backed_by(&in2.typ)
            .persisted_at(7)
            .with_range(0, 3),
        ParamDescriptor::parameter("PRI_IN2_MIN", "Input2 min")
            .backed_by(&in2.min)
            .persisted_at(8)
            .with_range(0, 4095),
        ParamDescriptor::parameter("PRI_IN2_MID", "Input2 mid")
            .backed_by(&in2.mid)
            .persisted_at(9)
            .with_range(0, 4095),
        ParamDescriptor::parameter("PRI_IN2_MAX", "Input2 max")
            .backed_by(&in2.max)
            .persisted_at(10)
            .with_range(0, 4095),
        ParamDescriptor::variable("PRI_IN1_RAW", "Input1 raw").backed_by(&in1.raw),
        ParamDescriptor::variable("PRI_IN2_RAW", "Input2 raw").backed_by(&in2.raw),
        ParamDescriptor::variable("PRI_IN1_CMD", "Input1 cmd").backed_by(&in1.cmd),
        ParamDescriptor::variable("PRI_IN2_CMD", "Input2 cmd").backed_by(&in2.cmd),
        // Feedback
        ParamDescriptor::variable("I_DC_LINK", "DC Link current A")
            .backed_by(&left.i_dc_link)
            .mirrored_by(&right.i_dc_link)
            .with_div(A2BIT_CONV),
        ParamDescriptor::variable("SPD_AVG", "Motor Measured Avg RPM")
            .backed_by(&state.speed_avg),
        ParamDescriptor::variable("SPDL", "Left Motor Measured RPM").backed_by(&left.n_mot),
        ParamDescriptor::variable("SPDR", "Right Motor Measured RPM").backed_by(&right.n_mot),
        ParamDescriptor::variable("RATE", "Rate *10")
            .with_init(RATE)
            .with_fix(4),
        ParamDescriptor::variable("SPD_COEF", "Speed Coefficient *10")
            .with_init(SPEED_COEFFICIENT)
            .with_mul(10)
            .with_fix(14),
        ParamDescriptor::variable("STR_COEF", "Steer Coefficient *10")
            .with_init(STEER_COEFFICIENT)
            .with_mul(10)
            .with_fix(14),
        ParamDescriptor::variable("BATV", "Battery voltage *100").backed_by(&state.batt1),
        ParamDescriptor::variable("IN_MAX", "Input command max").backed_by(&state.input_max),
        ParamDescriptor::variable("IN_MIN", "Input command min").backed_by(&state.input_min),
    ]
}
