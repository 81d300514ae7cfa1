mod support;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use support::{exact_options, slice_exact};
use topo_slicer::{
    CancellationToken, GenerationControl, GenerationTask, LevelOptions, Mesh, Real, SliceError,
    contour_levels, generate_layers, pipeline::GenerationEvent,
};

#[test]
fn layers_come_back_in_request_order() {
    let cone = Mesh::cone(10.0, 20.0, 24);
    let elevations: Vec<Real> = vec![15.0, 1.0, 10.0, 5.0, 19.0];
    let layers = slice_exact(&cone, &elevations);
    let got: Vec<(usize, Real)> = layers.iter().map(|l| (l.index, l.elevation)).collect();
    let want: Vec<(usize, Real)> = elevations.iter().copied().enumerate().collect();
    assert_eq!(got, want);
    assert!(layers[1].area() > layers[0].area());
}

#[test]
fn non_finite_elevations_are_rejected() {
    let result = generate_layers(
        &Mesh::cube(1.0),
        &[0.5, Real::NAN],
        &exact_options(),
        &GenerationControl::default(),
    );
    assert!(matches!(result, Err(SliceError::InvalidInput(_))));
}

#[test]
fn pre_cancelled_run_reports_cancellation() {
    let token = CancellationToken::new();
    token.cancel();
    let result = generate_layers(
        &Mesh::cube(1.0),
        &[0.25, 0.5, 0.75],
        &exact_options(),
        &GenerationControl::new(token),
    );
    let err = result.unwrap_err();
    assert!(err.is_cancelled());
}

#[test]
fn progress_reaches_the_total() {
    let calls = Arc::new(AtomicUsize::new(0));
    let max_seen = Arc::new(AtomicUsize::new(0));
    let control = {
        let (calls, max_seen) = (calls.clone(), max_seen.clone());
        GenerationControl::default().with_progress(move |p| {
            assert_eq!(p.total, 4);
            calls.fetch_add(1, Ordering::SeqCst);
            max_seen.fetch_max(p.completed, Ordering::SeqCst);
        })
    };
    let layers = generate_layers(&Mesh::cube(1.0), &[0.1, 0.2, 0.3, 0.4], &exact_options(), &control).unwrap();
    assert_eq!(layers.len(), 4);
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(max_seen.load(Ordering::SeqCst), 4);
}

#[test]
fn empty_request_is_an_empty_result() {
    let layers = slice_exact(&Mesh::cube(1.0), &[]);
    assert!(layers.is_empty());
    let layers = slice_exact(&Mesh::empty(), &[0.0, 1.0]);
    assert!(layers.iter().all(|l| l.is_empty()));
}

#[test]
fn background_task_delivers_layers() {
    let mesh = Arc::new(Mesh::frustum(50.0, 10.0, 30.0));
    let elevations = contour_levels(0.0, 30.0, 6, &LevelOptions::default());
    let task = GenerationTask::spawn(mesh, elevations.clone(), exact_options());
    let layers = task.wait().unwrap();
    assert_eq!(layers.len(), elevations.len());
    // the base sits exactly on the first plane and has no solid below it
    assert!(layers[0].is_empty());
    assert!(layers[1..].iter().all(|l| !l.is_empty()));
}

#[test]
fn background_task_can_be_cancelled() {
    let mesh = Arc::new(Mesh::cone(10.0, 10.0, 64));
    let task = GenerationTask::spawn(mesh, vec![1.0; 2000], exact_options());
    task.cancel();
    match task.wait() {
        Err(e) => assert!(e.is_cancelled()),
        // the run may finish before the flag is seen
        Ok(layers) => assert_eq!(layers.len(), 2000),
    }
}

#[test]
fn polling_sees_finished_event() {
    let task = GenerationTask::spawn(Arc::new(Mesh::cube(2.0)), vec![1.0], exact_options());
    let token = task.token();
    let mut finished = false;
    for _ in 0..10_000 {
        match task.try_event() {
            Some(GenerationEvent::Finished(result)) => {
                assert_eq!(result.unwrap().len(), 1);
                finished = true;
                break;
            },
            Some(GenerationEvent::Progress(p)) => assert!(p.completed <= p.total),
            None => std::thread::sleep(std::time::Duration::from_millis(1)),
        }
    }
    assert!(finished);
    assert!(!token.is_cancelled());
}
