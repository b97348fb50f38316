// Design constants, all measurements in real-world meters (1 unit = 1 meter)
// These are component-internal values, not user parameters.
// User-facing parameters and their defaults live in the schema tables (systems/hydro/params.rs)

// Timeline
pub const FRAMES_PER_SECOND: f32 = 24.0;  // playback rate used by hosts to turn seconds into frames
pub const TIMELINE_FIRST_FRAME: f32 = 1.0;
pub const ROTATION_FRAME_START: u32 = 1;
pub const ROTATION_FRAME_END: u32 = 100;  // one full turn of rotor/shaft

// Generator stack, fixed elevations of each cylinder center
pub const GEN_BASE_ELEV: f32 = 0.5;
pub const GEN_STATOR_ELEV: f32 = 2.0;
pub const GEN_ROTOR_ELEV: f32 = 2.0;
pub const GEN_SHAFT_ELEV: f32 = 0.5;
pub const GEN_EXCITER_ELEV: f32 = 3.5;
pub const GEN_EXCITER_RADIUS: f32 = 1.0;
pub const GEN_EXCITER_DEPTH: f32 = 0.5;

// Turbine placement circles
pub const STAY_VANE_CIRCLE: f32 = 2.5;
pub const GUIDE_VANE_CIRCLE: f32 = 1.8;
pub const BLADE_CIRCLE: f32 = 0.7;

// Turbine elevations
pub const SPIRAL_ELEV: f32 = 1.0;
pub const VANE_ELEV: f32 = 1.5;
pub const RUNNER_ELEV: f32 = 1.5;
pub const TURBINE_SHAFT_ELEV: f32 = 0.5;
pub const DRAFT_TUBE_ELEV: f32 = -0.5;

// Vane blocks (cube edge, then non-uniform scale as x, y (vertical), z)
pub const STAY_VANE_SIZE: f32 = 0.3;
pub const STAY_VANE_SCALE: [f32; 3] = [0.2, 1.5, 1.0];
pub const GUIDE_VANE_SIZE: f32 = 0.25;
pub const GUIDE_VANE_SCALE: [f32; 3] = [0.15, 1.0, 0.8];

// Curved primitive resolution
pub const DEFAULT_SEGMENTS: u32 = 32;
pub const RUNNER_SEGMENTS: u32 = 64;
pub const TUNNEL_SEGMENTS: u32 = 32;

// Intake stations along Z (fractions of structure depth measured from the upstream face)
pub const GATE_SLOT_FRACTION: f32 = 0.4;

// Intake structural members
pub const TUNNEL_SLOPE_DEG: f32 = 3.0;      // downstream tilt of every tunnel axis
pub const GUIDE_RAIL_WIDTH: f32 = 0.15;
pub const GUIDE_RAIL_DEPTH_PAD: f32 = 0.1;  // rails wrap the gate by this much on each face
pub const FLOOR_SLAB_THICK: f32 = 1.0;
pub const OUTER_SHELL_THICK: f32 = 0.3;
pub const PARAPET_HEIGHT: f32 = 1.1;
pub const PARAPET_THICK: f32 = 0.25;
pub const MIN_MEMBER_THICK: f32 = 0.1;      // floor for sill blocks and curtain walls that would collapse

// Surroundings
pub const GROUND_THICK: f32 = 0.5;
pub const WATER_PLANE_THICK: f32 = 0.05;
pub const TAILWATER_DEPTH: f32 = 1.0;       // downstream water surface above the downstream ground
pub const RIPPLE_AMPLITUDE: f32 = 0.1;      // vertical bob of the upstream water surface

// Flow indicators
pub const FLOW_PLANE_THICK: f32 = 0.02;
pub const FLOW_PLANE_LENGTH: f32 = 1.5;
pub const FLOW_PLANE_WIDTH_RATIO: f32 = 0.8;
pub const FLOW_PLANE_LIFT: f32 = 0.1;       // height above the sill

// Gantry crane
pub const CRANE_RAIL_SIZE: f32 = 0.2;
pub const CRANE_CLEARANCE: f32 = 4.0;       // rail top to bridge underside
pub const CRANE_TRUCK_LENGTH: f32 = 0.6;
pub const CRANE_BRIDGE_DEPTH: f32 = 0.6;
pub const CRANE_TROLLEY_LENGTH: f32 = 1.2;
pub const CRANE_TROLLEY_HEIGHT: f32 = 0.5;
pub const CRANE_ROPE_RADIUS: f32 = 0.03;
pub const CRANE_HOOK_DROP: f32 = 3.0;       // rope length below the bridge
pub const CRANE_SPREADER_HEIGHT: f32 = 0.2;

// Framing
pub const FRAMING_SMALL_LIMIT: f32 = 30.0;  // below this max dimension the camera backs off further
pub const FRAMING_SMALL_FACTOR: f32 = 3.0;
pub const FRAMING_LARGE_FACTOR: f32 = 1.5;
pub const CAMERA_DIRECTION: [f32; 3] = [1.0, 0.75, 1.0];
pub const KEY_LIGHT_DIRECTION: [f32; 3] = [-0.5, 1.0, 0.3];
pub const FILL_LIGHT_DIRECTION: [f32; 3] = [0.5, 1.5, -0.5];
pub const DEFAULT_CAMERA_POSITION: [f32; 3] = [10.0, 8.0, 10.0];
pub const KEY_LIGHT_ILLUMINANCE: f32 = 1_700.0;
pub const FILL_LIGHT_POWER: f32 = 1_000.0;  // watts
pub const LUMENS_PER_WATT: f32 = 683.0;    // fill light conversion for hosts that take lumens
pub const FILL_LIGHT_RANGE_FACTOR: f32 = 3.0; // point light range as a multiple of camera distance

// Viewer
pub const CLEAR_COLOR: [f32; 3] = [0.05, 0.06, 0.08];
pub const AMBIENT_BRIGHTNESS: f32 = 300.0;
pub const EXPORT_TOAST_SECONDS: f32 = 2.5;
