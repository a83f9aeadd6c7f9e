use crate::{
    config::SetpointConfig,
    types::{ControllerState, OutputCommand},
};

/// Two-point cooling regulator. Starts the compressor once the compartment is
/// strictly warmer than `setpoint + hysteresis` and stops it once strictly
/// colder than `setpoint`; anywhere in between, including both edges, the
/// current state is kept.
pub fn next_state(
    current: ControllerState,
    temperature_c: f64,
    config: &SetpointConfig,
) -> (ControllerState, OutputCommand) {
    let next = match current {
        ControllerState::Idle if temperature_c > config.upper_threshold_c() => {
            ControllerState::Running
        }
        ControllerState::Running if temperature_c < config.setpoint_c => ControllerState::Idle,
        state => state,
    };

    (next, next.output_command())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn config() -> SetpointConfig {
        SetpointConfig {
            setpoint_c: -18.0,
            hysteresis_c: 3.0,
        }
    }

    #[test]
    fn idle_holds_until_strictly_above_upper_edge() {
        let config = config();

        assert_eq!(
            next_state(ControllerState::Idle, -18.0, &config),
            (ControllerState::Idle, OutputCommand::OFF)
        );
        assert_eq!(
            next_state(ControllerState::Idle, -15.0, &config),
            (ControllerState::Idle, OutputCommand::OFF)
        );
        assert_eq!(
            next_state(ControllerState::Idle, -14.999, &config),
            (ControllerState::Running, OutputCommand::ON)
        );
    }

    #[test]
    fn running_holds_until_strictly_below_setpoint() {
        let config = config();

        assert_eq!(
            next_state(ControllerState::Running, -18.0, &config),
            (ControllerState::Running, OutputCommand::ON)
        );
        assert_eq!(
            next_state(ControllerState::Running, -18.001, &config),
            (ControllerState::Idle, OutputCommand::OFF)
        );
    }

    #[test]
    fn dead_band_never_changes_state() {
        let config = config();
        let temperatures: Vec<f64> = (1..300).map(|step| -18.0 + f64::from(step) * 0.01).collect();

        for start in [ControllerState::Idle, ControllerState::Running] {
            let mut state = start;
            for &temperature in temperatures.iter().chain(temperatures.iter().rev()) {
                state = next_state(state, temperature, &config).0;
                assert_eq!(state, start, "changed at {temperature}");
            }
        }
    }

    #[test]
    fn cooling_cycle_scenario() {
        let config = config();
        let mut state = ControllerState::Idle;
        let mut states = Vec::new();
        let mut commands = Vec::new();

        for temperature in [-10.0, -16.0, -19.0, -17.0] {
            let (next, command) = next_state(state, temperature, &config);
            state = next;
            states.push(next);
            commands.push(command);
        }

        assert_eq!(
            states,
            vec![
                ControllerState::Running,
                ControllerState::Running,
                ControllerState::Idle,
                ControllerState::Idle,
            ]
        );
        assert_eq!(
            commands,
            vec![
                OutputCommand::ON,
                OutputCommand::ON,
                OutputCommand::OFF,
                OutputCommand::OFF,
            ]
        );
    }

    #[test]
    fn command_mirrors_resulting_state() {
        let (state, command) = next_state(ControllerState::Idle, 5.0, &config());

        assert_eq!(state, ControllerState::Running);
        assert!(command.compressor_on);
        assert!(command.indicator_on);
    }
}
