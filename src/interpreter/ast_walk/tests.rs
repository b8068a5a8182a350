use std::cell::RefCell;
use std::rc::Rc;

use crate::interpreter::ast_walk::{Interpreter, RuntimeError, RuntimeErrorKind as Kind, Value};
use crate::interpreter::parse_code;

fn exec_in(interpreter: &Interpreter, src: &str) -> Result<Value, RuntimeError> {
    let program = parse_code(src).unwrap();
    interpreter.run(&program)
}

fn exec(src: &str) -> Result<Value, RuntimeError> { exec_in(&Interpreter::new(), src) }

// rendered result
fn show(src: &str) -> String { exec(src).unwrap().to_string() }

fn kind_of(src: &str) -> Kind { exec(src).unwrap_err().kind }

mod test_eval {
    use super::*;

    #[test]
    fn test_add() {
        // runTest (+ 1 2) => 3
        assert_eq!(exec("(+ 1 2)").unwrap(), Value::Integer(3));
        // runTest (+ (+ 1 2) (+ (+ 3 5 6) 4)) => 21
        assert_eq!(exec("(+ (+ 1 2) (+ (+ 3 5 6) 4))").unwrap(), Value::Integer(21));
    }

    #[test]
    fn test_subtract_and_multiply() {
        // runTest (- 3 2) => 1
        assert_eq!(exec("(- 3 2)").unwrap(), Value::Integer(1));
        assert_eq!(exec("(- 5)").unwrap(), Value::Integer(-5));
        assert_eq!(exec("(* 2 (- 10 4))").unwrap(), Value::Integer(12));
    }

    #[test]
    fn test_self_evaluating() {
        assert_eq!(exec("42").unwrap(), Value::Integer(42));
        assert_eq!(exec("#f").unwrap(), Value::Boolean(false));
        assert_eq!(exec("'()").unwrap(), Value::Empty);
        assert_eq!(exec(r#""hi""#).unwrap(), Value::text(b"hi"));
    }

    #[test]
    fn test_quote() {
        assert_eq!(show("(quote (1 2))"), "(1 2)");
        assert_eq!(show("'a"), "a");
        assert_eq!(show("'(a . b)"), "(a . b)");
    }

    #[test]
    fn test_program_returns_last_form() {
        assert_eq!(exec("1 2 3").unwrap(), Value::Integer(3));
        assert_eq!(exec("").unwrap(), Value::Empty);
        assert_eq!(exec("(begin)").unwrap(), Value::Empty);
    }

    #[test]
    fn test_unbound_symbol() {
        let err = exec("(+ 1 nope)").unwrap_err();
        assert_eq!(err.kind, Kind::UnboundSymbol);
        assert_eq!(err.message, "Unbound symbol: nope");
    }

    #[test]
    fn test_apply_non_procedure() {
        assert_eq!(kind_of("(1 2)"), Kind::NotProcedure);
        assert_eq!(kind_of("('(1) 2)"), Kind::NotProcedure);
    }

    #[test]
    fn test_improper_call() {
        assert_eq!(kind_of("(+ 1 . 2)"), Kind::MalformedArguments);
        assert_eq!(kind_of("(quote 1 . 2)"), Kind::MalformedArguments);
    }

    #[test]
    fn test_factorial() {
        let src = "(define (fact n) (if (= n 0) 1 (* n (fact (- n 1))))) (fact 10)";
        assert_eq!(exec(src).unwrap(), Value::Integer(3628800));
    }

    #[test]
    fn test_overflow() {
        assert_eq!(kind_of("(* 4611686018427387904 2)"), Kind::Overflow);
        assert_eq!(kind_of("(+ 9223372036854775807 1)"), Kind::Overflow);
    }

    #[test]
    fn test_wrong_type() {
        assert_eq!(kind_of("(+ 1 'a)"), Kind::WrongType);
        assert_eq!(kind_of("(car 1)"), Kind::WrongType);
        assert_eq!(kind_of("(cdr '())"), Kind::WrongType);
        assert_eq!(kind_of("(length (cons 1 2))"), Kind::WrongType);
    }
}

mod test_define {
    use super::*;

    #[test]
    fn test_define_returns_empty() {
        assert_eq!(exec("(define x 1)").unwrap(), Value::Empty);
        assert_eq!(exec("(define x 1) x").unwrap(), Value::Integer(1));
    }

    #[test]
    fn test_inner_define_shadows() {
        let interpreter = Interpreter::new();
        let src = "(define x 1) (define (f) (define x 2) x) (f)";
        assert_eq!(exec_in(&interpreter, src).unwrap(), Value::Integer(2));
        assert_eq!(exec_in(&interpreter, "x").unwrap(), Value::Integer(1));
    }

    #[test]
    fn test_closure_captures_environment() {
        let interpreter = Interpreter::new();
        let src = "(define (make-adder n) (lambda (x) (+ x n))) (define add5 (make-adder 5)) (add5 3)";
        assert_eq!(exec_in(&interpreter, src).unwrap(), Value::Integer(8));
        // a later top-level `n` is not the one add5 closed over
        assert_eq!(exec_in(&interpreter, "(define n 100) (add5 3)").unwrap(), Value::Integer(8));
    }

    #[test]
    fn test_variadic_lambda() {
        // runTest ((lambda args args) 1 2 3) => (1 2 3)
        assert_eq!(show("((lambda args args) 1 2 3)"), "(1 2 3)");
        assert_eq!(show("((lambda args args))"), "()");
        assert_eq!(show("(define (f . xs) (length xs)) (f 1 2 3 4)"), "4");
    }

    #[test]
    fn test_arity_mismatch() {
        let err = exec("(define (f a b) a) (f 1)").unwrap_err();
        assert_eq!(err.kind, Kind::ArityMismatch { expected: 2, actual: 1 });
        assert_eq!(kind_of("((lambda () 1) 1)"), Kind::ArityMismatch { expected: 0, actual: 1 });
        assert_eq!(kind_of("(if #t 1)"), Kind::ArityMismatch { expected: 3, actual: 2 });
        assert_eq!(kind_of("(cons 1)"), Kind::ArityMismatch { expected: 2, actual: 1 });
    }

    #[test]
    fn test_bad_definitions() {
        assert_eq!(kind_of("(define 1 2)"), Kind::BadSyntax);
        assert_eq!(kind_of("(define x)"), Kind::BadSyntax);
        assert_eq!(kind_of("(define)"), Kind::BadSyntax);
        assert_eq!(kind_of("(define (f))"), Kind::BadSyntax);
        assert_eq!(kind_of("(lambda (1) 1)"), Kind::BadSyntax);
        assert_eq!(kind_of("(lambda (x))"), Kind::BadSyntax);
    }

    #[test]
    fn test_multiple_body_forms() {
        assert_eq!(show("((lambda (x) (define y (* x 2)) (+ x y)) 3)"), "9");
    }

    #[test]
    fn test_set_binds_like_define() {
        // introduces a binding that did not exist
        assert_eq!(exec("(set! y 5) y").unwrap(), Value::Integer(5));

        // inside a call it binds in the call frame, leaving the outer one alone
        let interpreter = Interpreter::new();
        assert_eq!(exec_in(&interpreter, "(define x 1) (define (g) (set! x 2) x) (g)").unwrap(), Value::Integer(2));
        assert_eq!(exec_in(&interpreter, "x").unwrap(), Value::Integer(1));
    }

    #[test]
    fn test_counter_does_not_accumulate() {
        // each call gets a fresh frame, so the set! never reaches the captured n
        let src = "(define (make) (define n 0) (lambda () (set! n (+ n 1)) n)) (define c (make)) (c) (c)";
        assert_eq!(exec(src).unwrap(), Value::Integer(1));
    }

    #[test]
    fn test_inner_definitions_do_not_keep_frames() {
        let interpreter = Interpreter::new();
        exec_in(&interpreter, "(define (f) (define (g) 1) (g))").unwrap();
        let before = Rc::strong_count(interpreter.root());
        for _ in 0..100 {
            assert_eq!(exec_in(&interpreter, "(f)").unwrap(), Value::Integer(1));
        }
        assert_eq!(Rc::strong_count(interpreter.root()), before);
    }

    #[test]
    fn test_returned_inner_function_keeps_its_frame() {
        assert_eq!(show("(define (make) (define (g) 7) g) ((make))"), "7");
        let src = "(define (make n) (define (g) n) g) (define h (make 5)) (make 6) (h)";
        assert_eq!(show(src), "5");
        let src = "(define (count n) (define (loop i acc) (if (= i 0) acc (loop (- i 1) (+ acc 1)))) (loop n 0)) (count 50)";
        assert_eq!(show(src), "50");
    }

    #[test]
    fn test_procedure_rendering() {
        assert_eq!(show("(lambda (x) x)"), "#<procedure>");
        assert_eq!(show("car"), "#<procedure:car>");
    }
}

mod test_truthiness {
    use super::*;

    #[test]
    fn test_empty_list_is_true_everywhere() {
        assert_eq!(exec("(equal? '() '())").unwrap(), Value::Boolean(true));
        assert_eq!(exec("(null? '())").unwrap(), Value::Boolean(true));
        assert_eq!(exec("(if '() 1 2)").unwrap(), Value::Integer(1));
        assert_eq!(exec("(and '() 1)").unwrap(), Value::Boolean(true));
        assert_eq!(exec("(or #f '())").unwrap(), Value::Boolean(true));
        assert_eq!(exec("(cond ('() 1) (else 2))").unwrap(), Value::Integer(1));
        assert_eq!(exec("(not '())").unwrap(), Value::Boolean(false));
    }

    #[test]
    fn test_only_false_is_false() {
        assert_eq!(exec("(if #f 1 2)").unwrap(), Value::Integer(2));
        assert_eq!(exec("(if 0 1 2)").unwrap(), Value::Integer(1));
        assert_eq!(exec("(not #f)").unwrap(), Value::Boolean(true));
        assert_eq!(exec("(not 0)").unwrap(), Value::Boolean(false));
    }

    #[test]
    fn test_and() {
        assert_eq!(exec("(and)").unwrap(), Value::Boolean(true));
        assert_eq!(exec("(and 1 2 3)").unwrap(), Value::Boolean(true));
        assert_eq!(exec("(and 1 #f 3)").unwrap(), Value::Boolean(false));
        // short-circuits before the failing car
        assert_eq!(exec("(and #f (car 1))").unwrap(), Value::Boolean(false));
    }

    #[test]
    fn test_or() {
        assert_eq!(exec("(or)").unwrap(), Value::Boolean(false));
        assert_eq!(exec("(or #f #f)").unwrap(), Value::Boolean(false));
        assert_eq!(exec("(or #f 2)").unwrap(), Value::Boolean(true));
        assert_eq!(exec("(or 1 (car 1))").unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_cond() {
        assert_eq!(exec("(cond (#f 1) (else 2))").unwrap(), Value::Integer(2));
        assert_eq!(exec("(cond (#f 1))").unwrap(), Value::Empty);
        assert_eq!(exec("(cond)").unwrap(), Value::Empty);
        assert_eq!(exec("(cond ((= 1 2) 'a) ((= 1 1) 'b 'c))").unwrap(), Value::symbol("c"));
        assert_eq!(kind_of("(cond 1)"), Kind::BadSyntax);
    }
}

mod test_primitives {
    use super::*;

    #[test]
    fn test_lists() {
        assert_eq!(show("(cons 1 '(2 3))"), "(1 2 3)");
        assert_eq!(show("(cons 1 2)"), "(1 . 2)");
        assert_eq!(show("(car '(1 2))"), "1");
        assert_eq!(show("(cdr '(1 2))"), "(2)");
        assert_eq!(show("(list 1 (+ 1 1) 3)"), "(1 2 3)");
        assert_eq!(show("(list)"), "()");
        assert_eq!(show("(length '(1 2 3))"), "3");
        assert_eq!(show("(length '())"), "0");
    }

    #[test]
    fn test_predicates() {
        assert_eq!(show("(list? '(1 2))"), "#t");
        assert_eq!(show("(list? (cons 1 2))"), "#f");
        assert_eq!(show("(list? '())"), "#t");
        assert_eq!(show("(number? 1)"), "#t");
        assert_eq!(show("(number? 'a)"), "#f");
        assert_eq!(show("(procedure? car)"), "#t");
        assert_eq!(show("(function? (lambda (x) x))"), "#t");
        assert_eq!(show("(procedure? '(car))"), "#f");
    }

    #[test]
    fn test_equality() {
        assert_eq!(show("(equal? '(1 (2 . 3)) (list 1 (cons 2 3)))"), "#t");
        assert_eq!(show("(= 1 1)"), "#t");
        assert_eq!(show("(= 1 2)"), "#f");
        assert_eq!(show(r#"(equal? "ab" "ab")"#), "#t");
        assert_eq!(show("(equal? 'a \"a\")"), "#f");
        assert_eq!(show("(equal? '() #f)"), "#f");
        assert_eq!(show("(equal? car car)"), "#t");
        assert_eq!(show("(define (f) 1) (define (g) 1) (equal? f g)"), "#f");
        assert_eq!(show("(define (f) 1) (equal? f f)"), "#t");
    }

    #[test]
    fn test_eval_and_apply() {
        assert_eq!(show("(eval '(+ 1 2))"), "3");
        assert_eq!(show("(define x 7) (eval 'x)"), "7");
        assert_eq!(show("(apply + '(1 2 3))"), "6");
        assert_eq!(show("(apply (lambda (a b) (- a b)) (list 5 3))"), "2");
        assert_eq!(kind_of("(apply + 1)"), Kind::MalformedArguments);
        assert_eq!(kind_of("(apply 1 '())"), Kind::NotProcedure);
        assert_eq!(kind_of("(apply car '(1 2))"), Kind::ArityMismatch { expected: 1, actual: 2 });
    }

    #[test]
    fn test_write_returns_empty() {
        let buffer = Rc::new(RefCell::new(Vec::<u8>::new()));
        let interpreter = Interpreter::with_output(buffer.clone());
        assert_eq!(exec_in(&interpreter, "(write '(1 2))").unwrap(), Value::Empty);
        exec_in(&interpreter, r#"(define (f x) (write x)) (f "a b") (f '(x . #t))"#).unwrap();
        assert_eq!(String::from_utf8(buffer.borrow().clone()).unwrap(), "(1 2)\na b\n(x . #t)\n");
    }

    #[test]
    fn test_long_lists() {
        let items: Vec<String> = (0..100_000).map(|i| i.to_string()).collect();
        let literal = format!("'({})", items.join(" "));
        assert_eq!(exec(&format!("(length {})", literal)).unwrap(), Value::Integer(100_000));
        assert_eq!(show(&format!("(equal? {} {})", literal, literal)), "#t");
        let other = format!("'({} 0)", items[..99_999].join(" "));
        assert_eq!(show(&format!("(equal? {} {})", literal, other)), "#f");
    }

    #[test]
    fn test_begin() {
        assert_eq!(show("(begin 1 2)"), "2");
        assert_eq!(show("(begin (define z 3) (* z z))"), "9");
    }

    #[test]
    fn test_primitives_can_be_rebound() {
        assert_eq!(show("(define car cdr) (car '(1 2))"), "(2)");
    }
}

mod test_quasiquote {
    use super::*;

    #[test]
    fn test_plain_template_is_copied() {
        assert_eq!(show("`(a b c)"), "(a b c)");
        assert_eq!(show("`x"), "x");
    }

    #[test]
    fn test_unquote() {
        assert_eq!(show("(define x 5) `(a ,x (b ,(+ x 1)))"), "(a 5 (b 6))");
        assert_eq!(show("(define x 5) `,x"), "5");
    }

    #[test]
    fn test_unquote_splicing() {
        assert_eq!(show("`(1 ,@(list 2 3) 4)"), "(1 2 3 4)");
        assert_eq!(show("`(1 ,@'() 2)"), "(1 2)");
        assert_eq!(kind_of("`(1 ,@(cons 2 3))"), Kind::MalformedArguments);
        assert_eq!(kind_of("`,@(list 1)"), Kind::BadSyntax);
    }

    #[test]
    fn test_nested_quasiquote() {
        assert_eq!(show("(define x 1) `(a `(b ,(c ,x)))"), "(a (quasiquote (b (unquote (c 1)))))");
        assert_eq!(show("`(1 `,(+ 1 ,(+ 2 3)))"), "(1 (quasiquote (unquote (+ 1 5))))");
        assert_eq!(show("`(a `(b ,@(list ,@(list 1 2))))"), "(a (quasiquote (b (unquote-splicing (list 1 2)))))");
        // inner level only, nothing is evaluated
        assert_eq!(show("``,y"), "(quasiquote (unquote y))");
    }

    #[test]
    fn test_dotted_unquote() {
        assert_eq!(show("(define x 5) `(1 . ,x)"), "(1 . 5)");
        assert_eq!(show("`(1 . 2)"), "(1 . 2)");
    }
}
