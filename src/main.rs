use sense_hat::{Action, Config, Direction, Pixel, SenseHat};

use std::{env, time::Duration};

const SCROLL_SPEED: Duration = Duration::from_millis(100);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let message = env::args().skip(1).collect::<Vec<_>>().join(" ");
    let message = if message.is_empty() {
        "Hello".to_string()
    } else {
        message
    };

    let mut hat = SenseHat::new(Config::default())?;
    hat.matrix().set_low_light(true)?;
    hat.show_message(&message, SCROLL_SPEED, Pixel::new(255, 0, 0), Pixel::BLACK)?;

    match hat.temperature() {
        Ok(t) => println!("Temperature: {:.1} C", t),
        Err(e) => println!("Temperature unavailable: {}", e),
    }
    if let Ok(p) = hat.pressure() {
        println!("Pressure: {:.1} mbar", p);
    }
    if let Some(colour) = hat.colour() {
        let c = colour.colour()?;
        println!("Colour: r={} g={} b={} clear={}", c.red, c.green, c.blue, c.clear);
    }

    println!("Move the joystick, press the middle button to quit");
    loop {
        let event = hat.stick().read()?;
        println!("{:.3} {:?} {:?}", event.timestamp, event.direction(), event.action);
        if let Some(direction) = event.direction() {
            let letter = match direction {
                Direction::Up => 'U',
                Direction::Down => 'D',
                Direction::Left => 'L',
                Direction::Right => 'R',
                Direction::Middle => break,
            };
            if event.action == Action::Press {
                hat.show_letter(letter, Pixel::WHITE, Pixel::BLACK)?;
            }
        }
    }
    hat.matrix().clear(Pixel::BLACK)?;
    hat.matrix().set_low_light(false)?;
    Ok(())
}
